// Configuration loading tests.

use std::io::Write;
use voicelink::Config;

#[test]
fn loads_a_full_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("voicelink.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        r#"
[service]
name = "voicelink"

[service.http]
bind = "0.0.0.0"
port = 9090

[room]
url = "nats://rooms.internal:4222"
default_room = "kitchen"

[audio]
sample_rate = 48000
channels = 2
buffer_duration_ms = 50

[speech]
endpoint = "http://speech.internal:8000/process-audio"

[visualizer]
width = 600
height = 200
fft_size = 512
frame_interval_ms = 33
"#
    )
    .unwrap();

    let config = Config::load(path.with_extension("").to_str().unwrap()).unwrap();
    assert_eq!(config.service.http.port, 9090);
    assert_eq!(config.room.default_room, "kitchen");
    assert_eq!(config.audio.sample_rate, 48000);
    assert_eq!(config.visualizer.fft_size, 512);
    assert_eq!(
        config.speech.endpoint,
        "http://speech.internal:8000/process-audio"
    );
}

#[test]
fn missing_file_is_an_error() {
    assert!(Config::load("/nonexistent/voicelink").is_err());
}

#[test]
fn defaults_match_the_checked_in_config() {
    let config = Config::default();
    assert_eq!(config.service.http.port, 3080);
    assert_eq!(config.room.default_room, "assistant");
    assert_eq!(config.audio.sample_rate, 16000);
    assert_eq!(config.visualizer.width, 300);
    assert_eq!(config.visualizer.height, 100);
}
