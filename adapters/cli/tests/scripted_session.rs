use std::{
    fs,
    io::Write,
    path::PathBuf,
    process::{Command, Stdio},
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_path(name: &str, extension: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!(
        "geocoin_cli_{name}_{}_{nanos}.{extension}",
        std::process::id()
    ))
}

fn run_script(config: &PathBuf, save: &PathBuf, script: &str) -> String {
    let mut child = Command::new(env!("CARGO_BIN_EXE_geocoin"))
        .arg("--config")
        .arg(config)
        .arg("--save")
        .arg(save)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to launch geocoin");
    child
        .stdin
        .take()
        .expect("stdin piped")
        .write_all(script.as_bytes())
        .expect("failed to write script");
    let output = child.wait_with_output().expect("geocoin did not finish");
    assert!(output.status.success(), "geocoin exited with {}", output.status);
    String::from_utf8(output.stdout).expect("utf-8 output")
}

#[test]
fn tokens_survive_a_restart() {
    let config = temp_path("config", "toml");
    let save = temp_path("save", "json");
    fs::write(
        &config,
        "spawn_probability = 1.0\nneighborhood_radius = 1\n\n[spawn]\nlat = 0.00005\nlng = 0.00005\n",
    )
    .expect("write config");

    let first = run_script(&config, &save, "open 0 0\nmint\nmint\ndeposit\nquit\n");
    assert!(first.starts_with("Welcome to Geocoin.\n"));
    assert!(first.contains("Minted token {0:0:1}."));
    assert!(first.contains("Deposited token {0:0:1}."));

    let second = run_script(&config, &save, "open 0 0\nwithdraw\nstatus\n");
    assert!(second.contains("Withdrew token {0:0:1}."));
    assert!(second.contains("Tokens held: 2"));

    let _ = fs::remove_file(&config);
    let _ = fs::remove_file(&save);
}

#[test]
fn unknown_commands_do_not_end_the_session() {
    let config = temp_path("config_unknown", "toml");
    let save = temp_path("save_unknown", "json");
    fs::write(&config, "spawn_probability = 0.0\n").expect("write config");

    let output = run_script(&config, &save, "fly\nhelp\n");
    assert!(output.contains("unknown command `fly`"));
    assert!(output.contains("goto <lat> <lng>"));

    let _ = fs::remove_file(&config);
    let _ = fs::remove_file(&save);
}
