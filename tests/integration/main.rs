//! Integration tests for plzcache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const GRAPH: &str = r#"
[[target]]
label = "//src:lib"
outs = ["lib.a"]

[[target]]
label = "//src:_lib#srcs"
outs = ["srcs.txt"]

[[target]]
label = "//src:tool"
outs = ["tool"]
"#;

    fn plzcache() -> Command {
        let mut cmd = cargo_bin_cmd!("plzcache");
        cmd.env_remove("PLZCACHE_CONFIG");
        cmd
    }

    /// A workspace with a local config, a build graph and some outputs
    fn workspace() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(
            root.join(".plzcache.toml"),
            format!(
                "[cache]\ndir = '{}'\nworkers = 2\n",
                root.join("cache").display()
            ),
        )
        .unwrap();
        fs::write(root.join("graph.toml"), GRAPH).unwrap();

        let gen = root.join("plz-out/gen/src");
        fs::create_dir_all(&gen).unwrap();
        for out in ["lib.a", "srcs.txt", "tool"] {
            fs::write(gen.join(out), out).unwrap();
        }
        temp
    }

    fn gen_file(root: &Path, name: &str) -> std::path::PathBuf {
        root.join("plz-out/gen/src").join(name)
    }

    #[test]
    fn help_displays() {
        plzcache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("build output cache"));
    }

    #[test]
    fn version_displays() {
        plzcache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("plzcache"));
    }

    #[test]
    fn clean_everything() {
        let temp = workspace();
        plzcache()
            .current_dir(temp.path())
            .arg("clean")
            .assert()
            .success()
            .stdout(predicate::str::contains("Cleaned"));

        assert!(!temp.path().join("plz-out").exists());
    }

    #[test]
    fn clean_in_background() {
        let temp = workspace();
        plzcache()
            .current_dir(temp.path())
            .args(["clean", "--background"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cleaning in background"));

        assert!(!temp.path().join("plz-out").exists());
    }

    #[test]
    fn clean_targets_with_subtargets() {
        let temp = workspace();
        plzcache()
            .current_dir(temp.path())
            .args(["clean", "//src:lib"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cleaned 2 target(s)"));

        assert!(!gen_file(temp.path(), "lib.a").exists());
        assert!(!gen_file(temp.path(), "srcs.txt").exists());
        assert!(gen_file(temp.path(), "tool").exists());
    }

    #[test]
    fn clean_unknown_target() {
        let temp = workspace();
        plzcache()
            .current_dir(temp.path())
            .args(["clean", "//src:nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Target not found"));
    }

    #[test]
    fn clean_bad_label() {
        let temp = workspace();
        plzcache()
            .current_dir(temp.path())
            .args(["clean", "src:lib"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid build label"));
    }

    #[test]
    fn missing_explicit_config() {
        let temp = workspace();
        plzcache()
            .current_dir(temp.path())
            .args(["--config", "nowhere.toml", "clean"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Configuration file not found"));
    }

    #[test]
    fn store_then_retrieve() {
        let temp = workspace();
        let out = gen_file(temp.path(), "lib.a");

        plzcache()
            .current_dir(temp.path())
            .args(["store", "//src:lib", "--key", "c0ffee", "plz-out/gen/src/lib.a"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Stored //src:lib"));

        fs::remove_file(&out).unwrap();

        plzcache()
            .current_dir(temp.path())
            .args(["retrieve", "//src:lib", "--key", "c0ffee", "plz-out/gen/src/lib.a"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Restored 1 file(s)"));

        assert_eq!(fs::read_to_string(&out).unwrap(), "lib.a");
    }

    #[test]
    fn store_rejects_absolute_path() {
        let temp = workspace();
        let outside = temp.path().join("abs.txt");
        fs::write(&outside, "abs").unwrap();

        plzcache()
            .current_dir(temp.path())
            .args(["store", "//src:lib", "--key", "c0ffee"])
            .arg(&outside)
            .assert()
            .failure()
            .stdout(predicate::str::contains("Stored").not())
            .stderr(predicate::str::contains("Invalid cache path"));

        assert!(!temp.path().join("cache/src/lib").exists());
    }

    #[test]
    fn store_rejects_escaping_path() {
        let temp = workspace();
        plzcache()
            .current_dir(temp.path().join("plz-out"))
            .arg("--config")
            .arg(temp.path().join(".plzcache.toml"))
            .args(["store", "//src:lib", "--key", "c0ffee", "../graph.toml"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("may not contain .."));
    }

    #[test]
    fn store_rejects_absolute_package() {
        let temp = workspace();
        let victim = temp.path().join("victim");
        plzcache()
            .current_dir(temp.path())
            .arg("store")
            .arg(format!("//{}:x", victim.display()))
            .args(["--key", "c0ffee", "plz-out/gen/src/lib.a"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid build label"));

        assert!(!victim.exists());
    }

    #[test]
    fn retrieve_miss() {
        let temp = workspace();
        plzcache()
            .current_dir(temp.path())
            .args(["retrieve", "//src:lib", "--key", "abcd", "plz-out/gen/src/lib.a"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Cache miss"));
    }

    #[test]
    fn clean_removes_cache_entries() {
        let temp = workspace();
        plzcache()
            .current_dir(temp.path())
            .args(["store", "//src:lib", "--key", "c0ffee", "plz-out/gen/src/lib.a"])
            .assert()
            .success();

        plzcache()
            .current_dir(temp.path())
            .args(["clean", "//src:lib"])
            .assert()
            .success();

        plzcache()
            .current_dir(temp.path())
            .args(["retrieve", "//src:lib", "--key", "c0ffee", "plz-out/gen/src/lib.a"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Cache miss"));
    }

    #[test]
    fn store_with_cache_disabled() {
        let temp = workspace();
        fs::write(temp.path().join(".plzcache.toml"), "[cache]\nenabled = false\n").unwrap();

        plzcache()
            .current_dir(temp.path())
            .args(["store", "//src:lib", "plz-out/gen/src/lib.a"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Cache is disabled"));
    }
}
