//! Property-based tests for port pass-through and determinism

use chid_config::FinetuneSettings;
use chid_launch::build_command;
use proptest::prelude::*;
use std::path::Path;

proptest! {
    #[test]
    fn test_numeric_port_passes_through(port in 1u32..65536) {
        let port = port.to_string();
        let command = build_command(&FinetuneSettings::default(), Path::new("/opt/chid"), Some(port.as_str()));

        prop_assert_eq!(command.value_of("--master_port").unwrap(), port.as_str());
        prop_assert_eq!(command.count_of("--master_port"), 1);
    }

    #[test]
    fn test_any_nonempty_port_passes_through(port in "[^\\x00]{1,16}") {
        let command = build_command(&FinetuneSettings::default(), Path::new("/opt/chid"), Some(port.as_str()));

        prop_assert_eq!(command.value_of("--master_port").unwrap(), port.as_str());
    }

    #[test]
    fn test_build_is_deterministic(port in "[0-9]{0,5}", dir in "/[a-z]{1,8}(/[a-z]{1,8}){0,3}") {
        let settings = FinetuneSettings::default();
        let first = build_command(&settings, Path::new(&dir), Some(port.as_str()));
        let second = build_command(&settings, Path::new(&dir), Some(port.as_str()));

        prop_assert_eq!(first.to_shell_line(), second.to_shell_line());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_deepspeed_config_follows_launcher_dir(dir in "/[a-z]{1,8}(/[a-z]{1,8}){0,3}") {
        let command = build_command(&FinetuneSettings::default(), Path::new(&dir), None);
        let expected = Path::new(&dir).join("../ds_config/ds_finetune_large.json");

        prop_assert_eq!(Path::new(command.value_of("--deepspeed_config").unwrap()), expected.as_path());
    }
}
