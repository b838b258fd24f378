//! Integration tests for gradle-cache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use gradle_cache::cache::{build_key, KeyEnvironment};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Isolated runner: its own Gradle home, store, state file and config
    struct Runner {
        temp: TempDir,
    }

    impl Runner {
        fn new() -> Self {
            Self {
                temp: TempDir::new().unwrap(),
            }
        }

        fn gradle_home(&self) -> PathBuf {
            self.temp.path().join("gradle-home")
        }

        fn dependencies_dir(&self) -> PathBuf {
            self.gradle_home().join("caches")
        }

        fn project(&self) -> PathBuf {
            let dir = self.temp.path().join("project");
            fs::create_dir_all(&dir).unwrap();
            dir
        }

        fn cmd(&self, state_file: &str, sha: &str) -> Command {
            let mut cmd = cargo_bin_cmd!("gradle-cache");
            cmd.env("GRADLE_CACHE_CONFIG", self.temp.path().join("config.toml"))
                .env("GRADLE_CACHE_STORE_DIR", self.temp.path().join("store"))
                .env("GRADLE_CACHE_STATE_FILE", self.temp.path().join(state_file))
                .env("RUNNER_OS", "Linux")
                .env("GITHUB_JOB", "build")
                .env("GITHUB_SHA", sha)
                .env_remove("CACHE_KEY_PREFIX")
                .env_remove("INPUT_DEPENDENCIES-CACHE-ENABLED")
                .env_remove("INPUT_WORKFLOW-JOB-CONTEXT");
            cmd
        }

        fn phase(&self, phase: &str, state_file: &str, sha: &str) -> Command {
            let mut cmd = self.cmd(state_file, sha);
            cmd.args([phase, "--caches", "dependencies", "--gradle-user-home"])
                .arg(self.gradle_home())
                .arg("--project")
                .arg(self.project());
            cmd
        }
    }

    fn expected_key(sha: &str) -> String {
        expected_key_in_context("", sha)
    }

    fn expected_key_in_context(descriptor: &str, sha: &str) -> String {
        build_key(
            "dependencies",
            &KeyEnvironment {
                os: "Linux".to_string(),
                job: "build".to_string(),
                context_descriptor: descriptor.to_string(),
                sha: sha.to_string(),
                ..KeyEnvironment::default()
            },
        )
        .key
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("gradle-cache")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Restore and save Gradle caches across CI job runs",
            ));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("gradle-cache")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("gradle-cache"));
    }

    #[test]
    fn key_prints_key_and_restore_keys() {
        let runner = Runner::new();
        let key = expected_key("abc123");

        let output = runner
            .cmd("state.json", "abc123")
            .args(["key", "dependencies"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let stdout = String::from_utf8(output.stdout).unwrap();
        let lines: Vec<&str> = stdout.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], key);
        assert_eq!(lines[2], "dependencies|Linux|build");
        assert_eq!(lines[3], "dependencies|Linux");
    }

    #[test]
    fn key_applies_prefix() {
        let runner = Runner::new();
        runner
            .cmd("state.json", "abc123")
            .env("CACHE_KEY_PREFIX", "v2-")
            .args(["key", "wrapper", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"key\": \"v2-wrapper|Linux|build["))
            .stdout(predicate::str::contains("\"restore_keys\""));
    }

    #[test]
    fn restore_miss_then_save_then_restore_hit() {
        let runner = Runner::new();
        let key = expected_key("sha1");

        // First job: nothing cached yet
        runner
            .phase("restore", "job1.json", "sha1")
            .assert()
            .success()
            .stdout(predicate::str::contains("dependencies: miss"));

        write(
            &runner.dependencies_dir().join("modules-2").join("lib.jar"),
            "jar",
        );

        runner
            .phase("save", "job1.json", "sha1")
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("saved as {}", key)));

        // Second job on the same commit, fresh runner home
        fs::remove_dir_all(runner.dependencies_dir()).unwrap();

        runner
            .phase("restore", "job2.json", "sha1")
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("restored from {}", key)));
        assert_eq!(
            fs::read_to_string(runner.dependencies_dir().join("modules-2").join("lib.jar"))
                .unwrap(),
            "jar"
        );

        runner
            .phase("save", "job2.json", "sha1")
            .assert()
            .success()
            .stdout(predicate::str::contains("skipped (exact hit)"));
    }

    #[test]
    fn fallback_restore_saves_new_key() {
        let runner = Runner::new();
        write(&runner.dependencies_dir().join("a.txt"), "a");

        runner.phase("restore", "job0.json", "sha0").assert().success();
        // Output existed before restore, so there is nothing to save
        runner
            .phase("save", "job0.json", "sha0")
            .assert()
            .success()
            .stdout(predicate::str::contains("skipped (no key)"));

        fs::remove_dir_all(runner.dependencies_dir()).unwrap();
        runner.phase("restore", "job1.json", "sha0").assert().success();
        write(&runner.dependencies_dir().join("a.txt"), "a");
        runner.phase("save", "job1.json", "sha0").assert().success();

        fs::remove_dir_all(runner.dependencies_dir()).unwrap();
        runner
            .phase("restore", "job2.json", "sha1")
            .assert()
            .success()
            .stdout(predicate::str::contains(format!(
                "restored from {}",
                expected_key("sha0")
            )));
        runner
            .phase("save", "job2.json", "sha1")
            .assert()
            .success()
            .stdout(predicate::str::contains(format!(
                "saved as {}",
                expected_key("sha1")
            )));
    }

    #[test]
    fn other_job_context_restores_from_job_tier() {
        let runner = Runner::new();
        let previous = expected_key_in_context("java-11", "sha0");

        runner
            .phase("restore", "job1.json", "sha0")
            .args(["--input", "workflow-job-context=java-11"])
            .assert()
            .success();
        write(&runner.dependencies_dir().join("a.txt"), "a");
        runner
            .phase("save", "job1.json", "sha0")
            .args(["--input", "workflow-job-context=java-11"])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("saved as {}", previous)));

        fs::remove_dir_all(runner.dependencies_dir()).unwrap();
        runner
            .phase("restore", "job2.json", "sha1")
            .args(["--input", "workflow-job-context=java-17"])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("restored from {}", previous)));
        runner
            .phase("save", "job2.json", "sha1")
            .args(["--input", "workflow-job-context=java-17"])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!(
                "saved as {}",
                expected_key_in_context("java-17", "sha1")
            )));
    }

    #[test]
    fn invalid_policy_fails() {
        let runner = Runner::new();
        runner
            .phase("restore", "state.json", "sha1")
            .args(["--input", "dependencies-cache-enabled=maybe"])
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "Invalid cache-enabled parameter 'maybe'",
            ));
    }

    #[test]
    fn disabled_policy_from_env_input() {
        let runner = Runner::new();
        runner
            .phase("restore", "state.json", "sha1")
            .env("INPUT_DEPENDENCIES-CACHE-ENABLED", "false")
            .assert()
            .success()
            .stdout(predicate::str::contains("skipped (disabled)"));
    }

    #[test]
    fn policy_input_is_trimmed() {
        let runner = Runner::new();
        runner
            .phase("restore", "state.json", "sha1")
            .env("INPUT_DEPENDENCIES-CACHE-ENABLED", "false\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("skipped (disabled)"));
    }

    #[test]
    fn unknown_cache_fails() {
        let runner = Runner::new();
        runner
            .cmd("state.json", "sha1")
            .args(["key", "maven"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown cache name: maven"));
    }
}
