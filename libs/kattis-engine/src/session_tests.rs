/// End-to-end tests for a whole test session
///
/// These run real processes through `sh`, so they only build on unix:
/// 1. Correct programs pass every case and leave no diagnostics
/// 2. Wrong answers produce a diagnostic with input, expected and actual output
/// 3. Discovery failures are reported without stopping the other cases
/// 4. Concurrent cases never see each other's input or output
/// 5. Timeouts, crashes and missing programs get their own verdicts

#[cfg(all(test, unix))]
mod session {
    use crate::config::{ExitPolicy, SessionConfig};
    use crate::executor::TestSession;
    use kattis_common::naming::DIAGNOSTIC_SUFFIX;
    use kattis_common::types::{CaseStatus, Invocation};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn write_case(dir: &Path, id: &str, input: &str, answer: &str) {
        fs::write(dir.join(format!("{}.in", id)), input).unwrap();
        fs::write(dir.join(format!("{}.ans", id)), answer).unwrap();
    }

    fn sh(script: &str) -> Invocation {
        Invocation::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    fn diagnostics(dir: &Path) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.to_string_lossy().ends_with(DIAGNOSTIC_SUFFIX))
            .collect();
        found.sort();
        found
    }

    const SUM: &str = "read a b; echo $((a + b))";

    #[tokio::test]
    async fn test_sum_program_passes() {
        let tmp = TempDir::new().unwrap();
        write_case(tmp.path(), "1", "3 4\n", "7\n");

        let session = TestSession::new(sh(SUM), SessionConfig::new(tmp.path()));
        let summary = session.run().await.unwrap();

        assert_eq!(summary.total, 1);
        assert!(summary.success());
        let verdict = summary.verdict("1").unwrap();
        assert_eq!(verdict.status, CaseStatus::Passed);
        assert_eq!(verdict.actual_output, "7\n");
        assert!(verdict.diagnostic.is_none());
        assert!(diagnostics(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn test_wrong_answer_writes_diagnostic() {
        let tmp = TempDir::new().unwrap();
        write_case(tmp.path(), "1", "3 4\n", "7\n");

        let session = TestSession::new(sh("echo 8"), SessionConfig::new(tmp.path()));
        let summary = session.run().await.unwrap();

        assert!(!summary.success());
        let verdict = summary.verdict("1").unwrap();
        assert_eq!(verdict.status, CaseStatus::Mismatched);

        let files = diagnostics(tmp.path());
        assert_eq!(files.len(), 1);
        assert_eq!(verdict.diagnostic.as_ref(), Some(&files[0]));
        let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("1.in-"));

        let content = fs::read_to_string(&files[0]).unwrap();
        assert!(content.contains("3 4"));
        assert!(content.contains("7"));
        assert!(content.contains("8"));
        assert!(content.contains("sh -c echo 8"));
    }

    #[tokio::test]
    async fn test_non_utf8_input_is_kept_in_diagnostic() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("1.in"), b"caf\xe9 3 4\n").unwrap();
        fs::write(tmp.path().join("1.ans"), "7\n").unwrap();

        let session = TestSession::new(sh("echo 8"), SessionConfig::new(tmp.path()));
        let summary = session.run().await.unwrap();

        let verdict = summary.verdict("1").unwrap();
        assert_eq!(verdict.status, CaseStatus::Mismatched);
        let content = fs::read_to_string(verdict.diagnostic.as_ref().unwrap()).unwrap();
        assert!(content.contains("3 4"));
        assert!(content.contains("caf\u{FFFD} 3 4"));
    }

    #[tokio::test]
    async fn test_cat_passes_every_case() {
        let tmp = TempDir::new().unwrap();
        write_case(tmp.path(), "a", "hello\n", "hello\n");
        write_case(tmp.path(), "b", "1 2 3\n4 5 6\n", "1 2 3\n4 5 6\n");
        write_case(tmp.path(), "c", "", "");

        let session = TestSession::new(Invocation::new("cat", vec![]), SessionConfig::new(tmp.path()));
        let summary = session.run().await.unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 3);
    }

    #[tokio::test]
    async fn test_reversing_program_fails_with_reversed_output() {
        let tmp = TempDir::new().unwrap();
        write_case(tmp.path(), "1", "abc\n", "abc\n");
        write_case(tmp.path(), "2", "hello\n", "hello\n");

        let session = TestSession::new(Invocation::new("rev", vec![]), SessionConfig::new(tmp.path()));
        let summary = session.run().await.unwrap();

        assert_eq!(summary.failed, 2);
        for (case, reversed) in [("1", "cba\n"), ("2", "olleh\n")] {
            let verdict = summary.verdict(case).unwrap();
            assert_eq!(verdict.status, CaseStatus::Mismatched);
            assert_eq!(verdict.actual_output, reversed);
            let content = fs::read_to_string(verdict.diagnostic.as_ref().unwrap()).unwrap();
            assert!(content.contains(&format!("## Actual output\n\n```\n{}```", reversed)));
        }
    }

    #[tokio::test]
    async fn test_missing_trailing_newline_is_mismatch() {
        let tmp = TempDir::new().unwrap();
        write_case(tmp.path(), "1", "3 4\n", "7\n");

        let session = TestSession::new(sh("printf 7"), SessionConfig::new(tmp.path()));
        let summary = session.run().await.unwrap();

        assert_eq!(summary.verdict("1").unwrap().status, CaseStatus::Mismatched);
    }

    #[tokio::test]
    async fn test_missing_input_does_not_stop_other_cases() {
        let tmp = TempDir::new().unwrap();
        write_case(tmp.path(), "1", "3 4\n", "7\n");
        write_case(tmp.path(), "3", "10 5\n", "15\n");
        fs::write(tmp.path().join("2.ans"), "9\n").unwrap();

        let session = TestSession::new(sh(SUM), SessionConfig::new(tmp.path()));
        let summary = session.run().await.unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 2);
        assert!(matches!(
            summary.verdict("2").unwrap().status,
            CaseStatus::DiscoveryError { .. }
        ));
        assert_eq!(summary.verdict("1").unwrap().status, CaseStatus::Passed);
        assert_eq!(summary.verdict("3").unwrap().status, CaseStatus::Passed);
    }

    #[tokio::test]
    async fn test_concurrent_cases_do_not_cross_talk() {
        let tmp = TempDir::new().unwrap();
        for i in 0..50 {
            let line = format!("case-{}\n", i);
            // Every even case expects something else so it fails and leaves a diagnostic
            let answer = if i % 2 == 0 { format!("other-{}\n", i) } else { line.clone() };
            write_case(tmp.path(), &format!("{:02}", i), &line, &answer);
        }

        let config = SessionConfig::new(tmp.path()).with_max_parallel(0);
        let session = TestSession::new(sh("sleep 0.05; cat"), config);
        let summary = session.run().await.unwrap();

        assert_eq!(summary.total, 50);
        assert_eq!(summary.passed, 25);
        for i in 0..50 {
            let verdict = summary.verdict(&format!("{:02}", i)).unwrap();
            assert_eq!(verdict.actual_output, format!("case-{}\n", i));
            if let Some(path) = &verdict.diagnostic {
                let content = fs::read_to_string(path).unwrap();
                assert!(content.contains(&format!("case-{}\n", i)));
                assert!(content.contains(&format!("other-{}\n", i)));
                for j in (0..50).filter(|j| *j != i) {
                    assert!(!content.contains(&format!("case-{}\n", j)));
                }
            }
        }
        assert_eq!(diagnostics(tmp.path()).len(), 25);
    }

    #[tokio::test]
    async fn test_bounded_parallelism_still_runs_everything() {
        let tmp = TempDir::new().unwrap();
        for i in 0..12 {
            write_case(tmp.path(), &i.to_string(), &format!("{}\n", i), &format!("{}\n", i));
        }

        let config = SessionConfig::new(tmp.path()).with_max_parallel(2);
        let session = TestSession::new(Invocation::new("cat", vec![]), config);
        let summary = session.run().await.unwrap();

        assert_eq!(summary.total, 12);
        assert!(summary.success());
    }

    #[tokio::test]
    async fn test_hung_case_times_out_without_stalling_siblings() {
        let tmp = TempDir::new().unwrap();
        write_case(tmp.path(), "fast", "1\n", "1\n");
        write_case(tmp.path(), "slow", "hang\n", "hang\n");

        let script = "read x; if [ \"$x\" = hang ]; then sleep 30; fi; echo \"$x\"";
        let config = SessionConfig::new(tmp.path()).with_timeout_ms(300);
        let session = TestSession::new(sh(script), config);
        let summary = session.run().await.unwrap();

        assert_eq!(summary.verdict("fast").unwrap().status, CaseStatus::Passed);
        assert_eq!(
            summary.verdict("slow").unwrap().status,
            CaseStatus::TimedOut { limit_ms: 300 }
        );
    }

    #[tokio::test]
    async fn test_crash_is_runtime_error_unless_ignored() {
        let tmp = TempDir::new().unwrap();
        write_case(tmp.path(), "1", "3 4\n", "7\n");
        let script = "echo 7; exit 2";

        let strict = TestSession::new(sh(script), SessionConfig::new(tmp.path()));
        let summary = strict.run().await.unwrap();
        let verdict = summary.verdict("1").unwrap();
        assert_eq!(verdict.status, CaseStatus::RuntimeError { exit_code: Some(2) });
        assert!(verdict.diagnostic.is_some());

        let lenient_config = SessionConfig::new(tmp.path()).with_exit_policy(ExitPolicy::IgnoreExitCode);
        let lenient = TestSession::new(sh(script), lenient_config);
        let summary = lenient.run().await.unwrap();
        assert_eq!(summary.verdict("1").unwrap().status, CaseStatus::Passed);
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_error_per_case() {
        let tmp = TempDir::new().unwrap();
        write_case(tmp.path(), "1", "x\n", "x\n");
        write_case(tmp.path(), "2", "y\n", "y\n");

        let session = TestSession::new(
            Invocation::new("/no/such/solution", vec![]),
            SessionConfig::new(tmp.path()),
        );
        let summary = session.run().await.unwrap();

        assert_eq!(summary.failed, 2);
        for case in ["1", "2"] {
            assert!(matches!(
                summary.verdict(case).unwrap().status,
                CaseStatus::LaunchError { .. }
            ));
        }
        assert!(diagnostics(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn test_unopenable_input_is_io_error() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        write_case(tmp.path(), "1", "3 4\n", "7\n");
        write_case(tmp.path(), "2", "1 1\n", "2\n");
        let locked = tmp.path().join("1.in");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::File::open(&locked).is_ok() {
            // Permission bits do not apply to root
            return;
        }

        let session = TestSession::new(sh(SUM), SessionConfig::new(tmp.path()));
        let summary = session.run().await.unwrap();

        assert!(matches!(
            summary.verdict("1").unwrap().status,
            CaseStatus::IoError { .. }
        ));
        assert!(summary.verdict("1").unwrap().diagnostic.is_none());
        assert_eq!(summary.verdict("2").unwrap().status, CaseStatus::Passed);
        assert!(diagnostics(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn test_unwritable_results_dir_keeps_verdict() {
        let tmp = TempDir::new().unwrap();
        write_case(tmp.path(), "1", "3 4\n", "7\n");
        let results = tmp.path().join("results");
        fs::write(&results, "not a directory").unwrap();

        let config = SessionConfig::new(tmp.path()).with_results_dir(&results);
        let session = TestSession::new(sh("echo 8"), config);
        let summary = session.run().await.unwrap();

        let verdict = summary.verdict("1").unwrap();
        assert_eq!(verdict.status, CaseStatus::Mismatched);
        assert!(verdict.diagnostic.is_none());
        assert_eq!(summary.failed, 1);
        assert!(diagnostics(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn test_results_dir_override() {
        let tmp = TempDir::new().unwrap();
        let results = tmp.path().join("results");
        write_case(tmp.path(), "1", "3 4\n", "7\n");

        let config = SessionConfig::new(tmp.path()).with_results_dir(&results);
        let session = TestSession::new(sh("echo 8"), config);
        session.run().await.unwrap();

        assert!(diagnostics(tmp.path()).is_empty());
        assert_eq!(diagnostics(&results).len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_directory_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let session = TestSession::new(
            Invocation::new("cat", vec![]),
            SessionConfig::new(tmp.path().join("missing")),
        );

        assert!(session.run().await.is_err());
    }

    #[tokio::test]
    async fn test_empty_directory_succeeds() {
        let tmp = TempDir::new().unwrap();
        let session = TestSession::new(Invocation::new("cat", vec![]), SessionConfig::new(tmp.path()));

        let summary = session.run().await.unwrap();

        assert_eq!(summary.total, 0);
        assert!(summary.success());
    }
}
