pub mod common;
pub mod duv;
pub mod errors;
pub mod fsim;
pub mod harness;
pub mod testing;

#[cfg(test)]
pub mod roundtrip_test {
    use crate::common::config::Args;
    use crate::errors::HarnessError;
    use crate::testing::*;
    use test_case::test_case;

    fn test_args(data_dir: &str, run_cycles: u64, seed: u64) -> Args {
        Args {
            verbose: false,
            data_dir: data_dir.to_string(),
            verify: false,
            run_cycles: run_cycles,
            clock_period: 2,
            reset_time: 10,
            pipeline_depth: 4,
            flush_fraction: 0.25,
            seed: Some(seed),
            row_offer_one_in: 1,
            col_offer_one_in: 1,
            out_ready_one_in: 3,
            rows: 4,
            cols: 4,
            quiet: true,
        }
    }

    #[test_case(1000, 1; "run 1000 seed 1")]
    #[test_case(4000, 7; "run 4000 seed 7")]
    pub fn mac_generation_then_verification(run_cycles: u64, seed: u64) {
        let dir = tempfile::tempdir().unwrap();
        let dd = dir.path().to_str().unwrap().to_string();

        let gen_stats = run_mac(&test_args(&dd, run_cycles, seed)).unwrap();

        let mut args = test_args(&dd, run_cycles, seed);
        args.verify = true;
        let ver_stats = run_mac(&args).unwrap();

        assert_eq!(gen_stats.cycles, ver_stats.cycles);
        assert_eq!(gen_stats.golden_records, ver_stats.golden_records);
    }

    #[test]
    pub fn mac_verification_rejects_corrupted_golden() {
        let dir = tempfile::tempdir().unwrap();
        let dd = dir.path().to_str().unwrap().to_string();

        run_mac(&test_args(&dd, 1000, 3)).unwrap();

        // corrupt one golden record past the reset window
        let gold = dir.path().join("psum_out_gold.bins");
        let mut bytes = std::fs::read(&gold).unwrap();
        let idx = bytes.len() / 2;
        bytes[idx] ^= 0xff;
        std::fs::write(&gold, bytes).unwrap();

        let mut args = test_args(&dd, 1000, 3);
        args.verify = true;
        match run_mac(&args).unwrap_err() {
            HarnessError::GoldenMismatch { port, .. } => assert_eq!(port, "psum_out"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test_case(1000, 4; "run 1000 depth 4")]
    #[test_case(1000, 2; "run 1000 depth 2")]
    pub fn ctrl_generation_then_verification(run_cycles: u64, depth: u64) {
        let dir = tempfile::tempdir().unwrap();
        let dd = dir.path().to_str().unwrap().to_string();

        let mut args = test_args(&dd, run_cycles, 1);
        args.pipeline_depth = depth;
        run_ctrl(&args).unwrap();

        args.verify = true;
        let stats = run_ctrl(&args).unwrap();
        assert_eq!(stats.golden_records, 2 * stats.cycles);
    }

    #[test]
    pub fn missing_source_stream_is_a_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let dd = dir.path().to_str().unwrap().to_string();
        // no a_matrix.bin / b_matrix.bin were generated
        match run_systolic(&test_args(&dd, 1000, 1)).unwrap_err() {
            HarnessError::ResourceOpen { name, .. } => assert!(name.contains("a_matrix.bin")),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
