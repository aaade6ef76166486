use super::*;
use std::path::Path;

#[cfg(unix)]
#[tokio::test]
async fn test_production_runner_success() {
    let runner = TokioProcessRunner;
    let command = ProcessCommandBuilder::new("echo")
        .arg("hello world")
        .build();

    let output = runner.run(command).await.unwrap();
    assert!(output.status.success());
    assert_eq!(output.stdout.trim(), "hello world");
    assert!(output.stderr.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_production_runner_failure() {
    let runner = TokioProcessRunner;
    let command = ProcessCommandBuilder::new("false").build();

    let output = runner.run(command).await.unwrap();
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
}

#[cfg(unix)]
#[tokio::test]
async fn test_production_runner_env_and_dir() {
    let dir = tempfile::tempdir().unwrap();
    let runner = TokioProcessRunner;
    let command = ProcessCommandBuilder::new("sh")
        .args(["-c", "echo $REGION && pwd"])
        .env("REGION", "eu-west-2")
        .current_dir(dir.path())
        .build();

    let output = runner.run(command).await.unwrap();
    let mut lines = output.stdout.lines();
    assert_eq!(lines.next(), Some("eu-west-2"));
    let pwd = lines.next().unwrap();
    assert_eq!(
        Path::new(pwd).canonicalize().unwrap(),
        dir.path().canonicalize().unwrap()
    );
}

#[tokio::test]
async fn test_production_runner_command_not_found() {
    let runner = TokioProcessRunner;
    let command = ProcessCommandBuilder::new("nonexistent-command-12345").build();

    let result = runner.run(command).await;
    assert!(matches!(result, Err(ProcessError::CommandNotFound(_))));
}

#[tokio::test]
async fn test_mock_runner_basic() {
    let mut mock = MockProcessRunner::new();

    mock.expect_command("terraform")
        .with_args(|args| args == ["version"])
        .returns_stdout("Terraform v1.9.0\n")
        .returns_success()
        .finish();

    let output = mock
        .run(ProcessCommandBuilder::new("terraform").arg("version").build())
        .await
        .unwrap();

    assert!(output.status.success());
    assert_eq!(output.stdout, "Terraform v1.9.0\n");
    assert!(mock.verify_called("terraform", 1));
}

#[tokio::test]
async fn test_mock_runner_times_limit() {
    let mut mock = MockProcessRunner::new();

    mock.expect_command("terraform")
        .with_args(|args| args.first().map(String::as_str) == Some("init"))
        .returns_success()
        .times(1)
        .finish();

    let init = || ProcessCommandBuilder::new("terraform").arg("init").build();

    assert!(mock.run(init()).await.is_ok());
    assert!(matches!(
        mock.run(init()).await,
        Err(ProcessError::MockExpectationNotMet(_))
    ));
}

#[tokio::test]
async fn test_mock_runner_dir_matching_is_first_match() {
    let mut mock = MockProcessRunner::new();

    mock.expect_command("terraform")
        .in_dir("main/broken")
        .returns_exit_code(1)
        .finish();
    mock.expect_command("terraform").returns_success().finish();

    let broken = mock
        .run(
            ProcessCommandBuilder::new("terraform")
                .arg("plan")
                .current_dir(Path::new("/repo/main/broken"))
                .build(),
        )
        .await
        .unwrap();
    assert_eq!(broken.status, ExitStatus::Error(1));

    let fine = mock
        .run(
            ProcessCommandBuilder::new("terraform")
                .arg("plan")
                .current_dir(Path::new("/repo/main/fine"))
                .build(),
        )
        .await
        .unwrap();
    assert!(fine.status.success());

    let plans = mock.calls_matching(|cmd| cmd.args == ["plan"]);
    assert_eq!(plans.len(), 2);
}

#[tokio::test]
async fn test_mock_runner_unexpected_command() {
    let mock = MockProcessRunner::new();
    let result = mock
        .run(ProcessCommandBuilder::new("terraform").arg("apply").build())
        .await;
    assert!(matches!(result, Err(ProcessError::MockExpectationNotMet(_))));
}
