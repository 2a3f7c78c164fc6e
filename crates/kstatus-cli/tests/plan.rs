//! Offline planning through the CLI surface

use std::io::Write;

use clap::{CommandFactory, Parser};
use serde_json::json;

use kstatus_cli::commands::plan::{plan, PlanArgs};
use kstatus_cli::commands::validate::{validate, ValidateArgs};
use kstatus_cli::commands::DesiredArgs;
use kstatus_cli::{Cli, Commands, Error};
use kstatus_common::ValidationErrorKind;

fn instance_file(status: serde_json::Value) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let instance = json!({
        "apiVersion": "apps.example.com/v1alpha1",
        "kind": "TestCR",
        "metadata": {"name": "my-test", "namespace": "testing"},
        "status": status,
    });
    write!(file, "{}", instance).unwrap();
    file
}

fn plan_args(file: &tempfile::NamedTempFile, desired: DesiredArgs) -> PlanArgs {
    PlanArgs {
        instance: format!("@{}", file.path().display()),
        desired,
    }
}

/// Story: an operator re-reports a running migration; nothing is written
#[test]
fn story_repeated_condition_plans_no_change() {
    let file = instance_file(json!({"conditions": [{
        "type": "Running",
        "status": "True",
        "reason": "MigrationStarted",
        "lastTransitionTime": "2024-01-15T10:30:00Z",
    }]}));

    let output = plan(&plan_args(
        &file,
        DesiredArgs {
            conditions: Some(
                "- type: Running\n  status: \"True\"\n  reason: MigrationStarted\n".to_string(),
            ),
            ..DesiredArgs::default()
        },
    ))
    .unwrap();

    assert_eq!(output.action, "none");
    assert!(!output.changed);
    assert_eq!(output.status, None);
}

#[test]
fn test_replace_lists_plans_patch() {
    let file = instance_file(json!({"tags": ["a", "b", "c"]}));
    let desired = DesiredArgs {
        status: Some(r#"{"tags": ["a", "b"]}"#.to_string()),
        ..DesiredArgs::default()
    };

    let lenient = plan(&plan_args(&file, desired.clone())).unwrap();
    assert_eq!(lenient.action, "none");

    let strict = plan(&plan_args(
        &file,
        DesiredArgs {
            replace_lists: true,
            ..desired
        },
    ))
    .unwrap();
    assert_eq!(strict.action, "patch");
    assert_eq!(strict.status, Some(json!({"tags": ["a", "b"]})));
}

#[test]
fn test_replace_plans_full_status() {
    let file = instance_file(json!({"hello": "world", "stale": 1}));
    let output = plan(&plan_args(
        &file,
        DesiredArgs {
            status: Some("hello: world".to_string()),
            replace: true,
            ..DesiredArgs::default()
        },
    ))
    .unwrap();

    assert_eq!(output.action, "replace");
    assert_eq!(output.status, Some(json!({"hello": "world"})));
}

#[test]
fn test_conflicting_inputs_rejected() {
    let file = instance_file(json!({}));
    let err = plan(&plan_args(
        &file,
        DesiredArgs {
            status: Some(r#"{"conditions": [{"type": "A", "status": "True"}]}"#.to_string()),
            conditions: Some(r#"[{"type": "B", "status": "True"}]"#.to_string()),
            ..DesiredArgs::default()
        },
    ))
    .unwrap_err();

    assert!(matches!(
        err,
        Error::Status(kstatus_common::Error::ConflictingInputs)
    ));
}

#[test]
fn test_validate_reports_kind() {
    let err = validate(&ValidateArgs {
        conditions: r#"[{"type": "Ready", "status": "True", "reason": "not_camel"}]"#.to_string(),
    })
    .unwrap_err();

    match err {
        Error::Status(e) => assert_eq!(e.validation_kind(), Some(ValidationErrorKind::InvalidFormat)),
        other => panic!("expected status error, got {:?}", other),
    }
}

#[test]
fn test_validate_normalizes() {
    let conditions = validate(&ValidateArgs {
        conditions: "- type: Ready\n  status: false\n  message: ~\n".to_string(),
    })
    .unwrap();
    assert_eq!(conditions.len(), 1);
    assert_eq!(
        conditions[0].to_value(),
        json!({"type": "Ready", "status": "False"})
    );
}

#[test]
fn test_cli_parses_apply_flags() {
    let cli = Cli::try_parse_from([
        "kstatus",
        "apply",
        "--api",
        "apps.example.com/v1alpha1",
        "--kind",
        "TestCR",
        "--name",
        "my-test",
        "-n",
        "testing",
        "--status",
        "hello: world",
        "--force",
        "--replace-lists",
    ])
    .unwrap();

    match cli.command {
        Commands::Apply(args) => {
            assert_eq!(args.target.api_version, "apps.example.com/v1alpha1");
            assert_eq!(args.target.namespace.as_deref(), Some("testing"));
            assert!(args.desired.replace);
            assert!(args.desired.replace_lists);
            assert_eq!(args.cluster.kubeconfig, None);
        }
        other => panic!("expected apply, got {:?}", other),
    }
}

#[test]
fn test_cli_api_version_defaults_to_v1() {
    let cli = Cli::try_parse_from([
        "kstatus", "apply", "--kind", "ConfigMap", "--name", "cm",
    ])
    .unwrap();
    match cli.command {
        Commands::Apply(args) => assert_eq!(args.target.api_version, "v1"),
        other => panic!("expected apply, got {:?}", other),
    }
}

#[test]
fn test_cluster_flags_fall_back_to_environment() {
    let cli = Cli::command();
    let apply = cli.find_subcommand("apply").unwrap();
    let env_of = |id: &str| {
        apply
            .get_arguments()
            .find(|arg| arg.get_id() == id)
            .and_then(|arg| arg.get_env())
            .map(|env| env.to_string_lossy().into_owned())
    };

    assert_eq!(env_of("kubeconfig").as_deref(), Some("K8S_AUTH_KUBECONFIG"));
    assert_eq!(env_of("context").as_deref(), Some("K8S_AUTH_CONTEXT"));
}
