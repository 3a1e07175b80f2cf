use assert_cmd::Command;

fn cli(config_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("orioz-cli").unwrap();
    cmd.env_remove("ORIOZ_ENV")
        .env("RUST_LOG", "off")
        .arg("--config-dir")
        .arg(config_dir);
    cmd
}

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    let output = cli(dir.path()).arg("--help").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    for command in ["run", "plan", "status"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn plan_describes_a_first_run() {
    let dir = tempfile::tempdir().unwrap();
    let output = cli(dir.path()).arg("plan").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Application user 'oriozapp' created.",
            "Collection 'members' created or already exists.",
            "Collection 'events' created or already exists.",
            "Collection 'news' created or already exists.",
            "Collection 'transactions' created or already exists.",
            "Default ADMIN user created.",
        ]
    );
}

#[test]
fn plan_reads_the_config_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("base.toml"),
        "[database]\nname = \"from-file\"\n\n[app_user]\nenabled = false\n",
    )
    .unwrap();

    let output = cli(dir.path()).args(["plan", "--json"]).output().unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["database"], "from-file");
    assert_eq!(report["outcomes"][0]["step"], "user_disabled");
    assert_eq!(report["outcomes"][5]["step"], "admin_created");
}

#[test]
fn unknown_environment_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = cli(dir.path())
        .env("ORIOZ_ENV", "qa")
        .arg("plan")
        .output()
        .unwrap();
    assert!(!output.status.success());
}
