use vela_std_core::{ListKind, ListStyle, VelaArray, VelaString};
use velac::config::OptLevel;
use velac::{read_string, Engine, EngineError, VelaConfig};

fn write_config(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vela.toml");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

#[test]
fn test_engine_from_config_file() {
    let (_dir, path) = write_config(
        r#"
        [jit]
        opt_level = "none"
        verify = true

        [intl]
        default_locale = "es"
        "#,
    );
    let config = VelaConfig::load(&path).unwrap();
    assert_eq!(config.jit.opt_level, OptLevel::None);

    let mut engine = Engine::new(config).unwrap();
    let shout = VelaString::new("HOLA");
    assert_eq!(read_string(&engine.string_to_lower_case(&shout).unwrap()).unwrap(), "hola");

    let lf = engine.list_format(None, ListKind::Conjunction, ListStyle::Long).unwrap();
    let items = VelaArray::from_values(["uno", "dos"].into_iter().map(VelaString::new));
    let out = engine.format(lf.value(), &[items.value()]).unwrap();
    assert_eq!(read_string(&out).unwrap(), "uno y dos");
}

#[test]
fn test_every_opt_level_compiles() {
    for opt_level in [OptLevel::None, OptLevel::Speed, OptLevel::SpeedAndSize] {
        let mut config = VelaConfig::default();
        config.jit.opt_level = opt_level;
        config.jit.verify = false;
        let mut engine = Engine::new(config).unwrap();
        let s = VelaString::new("ABCDEFGHIJKLMNOPQRSTUVWXYZ");
        let out = engine.string_to_lower_case(&s).unwrap();
        assert_eq!(read_string(&out).unwrap(), "abcdefghijklmnopqrstuvwxyz");
    }
}

#[test]
fn test_bad_config_file_is_reported() {
    let (_dir, path) = write_config("[jit]\nverify = \"sometimes\"\n");
    let err = VelaConfig::load(&path).unwrap_err();
    let err = EngineError::from(err);
    assert!(err.to_string().starts_with("Failed to parse config"));
}
