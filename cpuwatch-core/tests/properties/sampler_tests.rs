//! Property tests for vmstat output parsing

use cpuwatch_core::sampler::parse_vmstat;
use proptest::prelude::*;

/// One-decimal percentage in 0.0..=100.0, exactly representable in its
/// formatted form so round-tripping through the line is lossless
fn pct() -> impl Strategy<Value = f64> {
    (0u16..=1000).prop_map(|v| f64::from(v) / 10.0)
}

/// Non-numeric junk that may precede the CPU columns on a vmstat line
fn prefix() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("kthr memory page faults cpu".to_string()),
        Just(" 1  1 1638245  8367700   0   0".to_string()),
        Just("r b avm fre".to_string()),
    ]
}

proptest! {
    /// The last four numeric tokens always come back as us/sy/id/wa with
    /// usage computed as their us+sy+wa sum
    #[test]
    fn parses_trailing_four_columns(
        us in pct(), sy in pct(), id in pct(), wa in pct(),
        junk in prefix(),
    ) {
        let line = format!("{junk} {us:.1} {sy:.1} {id:.1} {wa:.1}");
        let reading = parse_vmstat(&line).unwrap();
        prop_assert!((reading.us - us).abs() < 1e-9);
        prop_assert!((reading.sy - sy).abs() < 1e-9);
        prop_assert!((reading.id - id).abs() < 1e-9);
        prop_assert!((reading.wa - wa).abs() < 1e-9);
        prop_assert!((reading.usage() - (us + sy + wa)).abs() < 1e-9);
    }

    /// Earlier lines never shadow the last non-blank one
    #[test]
    fn only_last_non_blank_line_counts(
        us in pct(), sy in pct(), id in pct(), wa in pct(),
        trailing_blanks in 0usize..4,
    ) {
        let blanks = "\n".repeat(trailing_blanks);
        let output =
            format!("header line\n 9 9 9 9 9 9\n{us:.1} {sy:.1} {id:.1} {wa:.1}\n{blanks}");
        let reading = parse_vmstat(&output).unwrap();
        prop_assert!((reading.us - us).abs() < 1e-9);
    }

    /// Fewer than four numeric tokens always fails, no matter the words
    /// around them
    #[test]
    fn too_few_numbers_is_parse_error(
        values in prop::collection::vec(pct(), 0..4),
        words in prop::collection::vec("[a-z]{1,8}", 0..5),
    ) {
        let mut tokens: Vec<String> = words;
        tokens.extend(values.iter().map(|v| format!("{v:.1}")));
        let line = tokens.join(" ");
        prop_assert!(parse_vmstat(&line).is_err());
    }
}
