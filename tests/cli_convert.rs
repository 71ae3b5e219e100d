use assert_cmd::Command;

#[test]
fn command_convert() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("cnp")?;
    let output = cmd
        .arg("convert")
        .arg("tests/cnp/profiles.csv")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(stdout.starts_with("node,chromosome,allele,start,end,value"));
    // A = [2,3,2] against diploid 2: entry gain, then closure back to baseline
    assert!(stdout.contains("A,chr1,a,0,10,0"));
    assert!(stdout.contains("A,chr1,a,10,20,1"));
    assert!(stdout.contains("A,chr1,a,20,30,0"));
    assert!(stdout.contains("B,chr1,a,10,20,2"));
    assert_eq!(stdout.lines().count(), 10);

    Ok(())
}

#[test]
fn command_convert_round_trip() -> anyhow::Result<()> {
    let tempdir = tempfile::tempdir()?;
    let bp_file = tempdir.path().join("bp.csv");

    let mut cmd = Command::cargo_bin("cnp")?;
    cmd.arg("convert")
        .arg("tests/cnp/profiles.csv")
        .arg("-o")
        .arg(&bp_file)
        .assert()
        .success();

    let mut cmd = Command::cargo_bin("cnp")?;
    let output = cmd
        .arg("convert")
        .arg(bp_file.to_str().unwrap())
        .arg("--invert")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    let original = std::fs::read_to_string("tests/cnp/profiles.csv")?;
    assert_eq!(stdout.trim(), original.trim());

    Ok(())
}

#[test]
fn command_convert_diploid() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("cnp")?;
    let output = cmd
        .arg("convert")
        .arg("tests/cnp/profiles.csv")
        .arg("--diploid")
        .arg("3")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    // C = [2,2,2] against diploid 3
    assert!(stdout.contains("C,chr1,a,0,10,-1"));
    assert!(stdout.contains("C,chr1,a,20,30,1"));

    Ok(())
}
