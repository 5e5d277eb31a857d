//! Whole-pipeline tests over a realistic manifest and error catalog.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use sdkforge_core::pagination::{HasMore, ValuePlan};
use sdkforge_core::{
    CompileError, CompilerConfig, ErrorCatalog, ManifestError, ManifestLabel, ManifestSource,
    PaginationKind, SourceFormat, compile_all, compile_manifest,
};

const LOGS: &str = r#"{
    "metadata": {"shortName": "cls", "displayName": "Cloud Log Service", "version": "2020-10-16"},
    "actions": {
        "SearchLog": {
            "document": "Searches logs.",
            "input": "SearchLogRequest",
            "output": "SearchLogResponse"
        },
        "DescribeTopics": {
            "document": "This action is deprecated, use DescribeTopicsV2.\n\nLists topics.",
            "status": "deprecated",
            "input": "DescribeTopicsRequest",
            "output": "DescribeTopicsResponse"
        },
        "DeleteTopic": {
            "input": "DeleteTopicRequest",
            "output": "DeleteTopicResponse"
        }
    },
    "objects": {
        "SearchLogRequest": {"members": [
            {"name": "TopicId", "type": "string", "member": "string"},
            {"name": "From", "type": "string", "member": "datetime_iso"},
            {"name": "Query", "type": "object", "member": "LogQuery", "required": false}
        ]},
        "LogQuery": {"usage": "in", "members": [
            {"name": "Statement", "type": "string", "member": "string"},
            {"name": "Paging", "type": "object", "member": "Paging", "required": false}
        ]},
        "Paging": {"usage": "in", "members": [
            {"name": "Cursor", "type": "string", "member": "string", "required": false},
            {"name": "Sort", "type": "string", "member": "string", "default": "desc"}
        ]},
        "SearchLogResponse": {"members": [
            {"name": "NextCursor", "type": "string", "member": "string", "output_required": false},
            {"name": "ListOver", "type": "bool", "member": "bool"},
            {"name": "Results", "type": "list", "member": "LogInfo"},
            {"name": "RequestId", "type": "string", "member": "string"}
        ]},
        "LogInfo": {"usage": "out", "members": [
            {"name": "Time", "type": "int", "member": "int64"},
            {"name": "Content", "type": "string", "member": "string"}
        ]},
        "DescribeTopicsRequest": {"members": [
            {"name": "Offset", "type": "int", "member": "int64", "required": false},
            {"name": "Limit", "type": "int", "member": "int64", "required": false}
        ]},
        "DescribeTopicsResponse": {"members": [
            {"name": "Topics", "type": "list", "member": "TopicInfo"},
            {"name": "TotalCount", "type": "int", "member": "int64"},
            {"name": "RequestId", "type": "string", "member": "string"}
        ]},
        "TopicInfo": {"usage": "out", "members": [
            {"name": "TopicId", "type": "string", "member": "string"}
        ]},
        "DeleteTopicRequest": {"members": [
            {"name": "TopicId", "type": "string", "member": "string"}
        ]},
        "DeleteTopicResponse": {"members": [
            {"name": "RequestId", "type": "string", "member": "string"}
        ]}
    }
}"#;

const CATALOG: &str = r#"[
    {"code": "OperationDenied.AccountIsolate", "description": "Account isolated.", "solution": "无",
     "productName": "cls", "productVersion": "2020-10-16"},
    {"code": "OperationDenied", "description": "Denied.",
     "productName": "cls", "productVersion": "2020-10-16"},
    {"code": "OperationDenied.ACLFailed", "description": "ACL check failed.", "solution": "Check the ACL.",
     "productName": "cls", "productVersion": "2020-10-16"},
    {"code": "InternalError", "description": "Internal error.",
     "productName": "cls", "productVersion": "2020-10-16"},
    {"code": "ResourceNotFound.TopicNotExist", "description": "No topic.",
     "productName": "cls", "productVersion": "2020-10-16"},
    {"code": "InternalError", "description": "Internal error.", "productName": "common", "productVersion": ""},
    {"code": "AuthFailure.SignatureExpire", "description": "Expired.", "productName": "common"},
    {"code": "InternalError", "description": "Other service.", "productName": "cvm", "productVersion": "2017-03-12"}
]"#;

fn source(contents: &str) -> ManifestSource {
    ManifestSource {
        origin: "cls.json".into(),
        format: SourceFormat::Json,
        contents: contents.into(),
    }
}

fn catalog() -> ErrorCatalog {
    ErrorCatalog::from_json(CATALOG, &CompilerConfig::default().errors).unwrap()
}

#[test]
fn test_actions_and_deprecation() {
    let compiled = compile_manifest(&source(LOGS), None, &CompilerConfig::default()).unwrap();
    let names: Vec<_> = compiled.actions.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["DeleteTopic", "DescribeTopics", "SearchLog"]);

    let describe = &compiled.actions[1];
    assert_eq!(
        describe.deprecation_message.as_deref(),
        Some("This action is deprecated, use DescribeTopicsV2.")
    );
    assert_eq!(describe.document, "Lists topics.");
    assert!(!compiled.actions[0].pagination.is_paginated());
}

#[test]
fn test_canonical_object_order() {
    let compiled = compile_manifest(&source(LOGS), None, &CompilerConfig::default()).unwrap();
    let names: Vec<_> = compiled.objects.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "DeleteTopicRequest",
            "DeleteTopicResponse",
            "DescribeTopicsRequest",
            "DescribeTopicsResponse",
            "SearchLogRequest",
            "SearchLogResponse",
            "LogInfo",
            "LogQuery",
            "Paging",
            "TopicInfo",
        ]
    );
    assert!(compiled.unreachable.is_empty());

    let search = &compiled.objects[4];
    let from = &search.fields[1];
    assert_eq!(from.stored.to_string(), "Date");
    assert_eq!(from.date.unwrap().encoding.wire_format(), "yyyy-MM-dd'T'HH:mm:ssXXX");
}

#[test]
fn test_nested_token_pagination() {
    let compiled = compile_manifest(&source(LOGS), None, &CompilerConfig::default()).unwrap();
    let search = compiled.actions[2].pagination.pagination().unwrap();

    let PaginationKind::Token { input, output } = &search.kind else {
        panic!("expected token pagination, got {:?}", search.kind);
    };
    assert_eq!(input.to_string(), "Query.Paging.Cursor");
    assert_eq!(output.to_string(), "NextCursor");
    assert_eq!(search.has_more, HasMore::TokenPresent(output.clone()));

    // Query and Paging are both optional: each level branches.
    let query = &search.next_request.fields[2];
    assert_eq!(query.field, "Query");
    let ValuePlan::Optional { present, absent } = &query.value else {
        panic!("Query should branch");
    };
    assert!(matches!(present.fields[1].value, ValuePlan::Optional { .. }));
    assert_eq!(absent.fields[0].value, ValuePlan::Unset);
    let ValuePlan::Nested { rebuild } = &absent.fields[1].value else {
        panic!("absent Query rebuilds Paging without branching");
    };
    assert_eq!(
        rebuild.fields[1].value,
        ValuePlan::Default {
            value: "desc".into()
        }
    );
}

#[test]
fn test_offset_pagination_with_total_count() {
    let compiled = compile_manifest(&source(LOGS), None, &CompilerConfig::default()).unwrap();
    let topics = compiled.actions[1].pagination.pagination().unwrap();
    assert!(matches!(
        &topics.kind,
        PaginationKind::Offset { output: None, .. }
    ));
    assert_eq!(topics.total_count.as_ref().unwrap().to_string(), "TotalCount");
}

#[test]
fn test_error_taxonomy() {
    let catalog = catalog();
    let compiled =
        compile_manifest(&source(LOGS), Some(&catalog), &CompilerConfig::default()).unwrap();
    let errors = compiled.errors.unwrap();

    assert_eq!(errors.all.len(), 5);
    let denied = errors.domain("OperationDenied").unwrap();
    let identifiers: Vec<_> = denied.iter().map(|e| e.identifier.as_str()).collect();
    assert_eq!(identifiers, ["aCLFailed", "accountIsolate", "other"]);
    assert_eq!(errors.all["operationDenied_AccountIsolate"].solution, None);
    assert_eq!(
        errors.common.get("internalError").map(String::as_str),
        Some("internalError")
    );
    assert_eq!(errors.common.len(), 1);
}

#[test]
fn test_deterministic_output() {
    let catalog = catalog();
    let config = CompilerConfig::default();
    let first = compile_manifest(&source(LOGS), Some(&catalog), &config).unwrap();
    let second = compile_manifest(&source(LOGS), Some(&catalog), &config).unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_malformed_catalog_aborts_manifest() {
    let bad = ErrorCatalog::from_json(
        r#"[{"code": "A.B.C", "description": "", "productName": "cls", "productVersion": "2020-10-16"}]"#,
        &CompilerConfig::default().errors,
    )
    .unwrap();
    let err: CompileError =
        compile_manifest(&source(LOGS), Some(&bad), &CompilerConfig::default()).unwrap_err();
    assert!(matches!(err.source, ManifestError::InvalidErrorCode { .. }));
    assert_eq!(
        err.manifest,
        ManifestLabel::Known(sdkforge_core::ManifestId::new("cls", "2020-10-16"))
    );
}

#[test]
fn test_parallel_batch() {
    let yaml = r#"
metadata:
  shortName: tag
  displayName: Tag
  version: "2018-08-13"
actions:
  GetResources:
    input: GetResourcesRequest
    output: GetResourcesResponse
objects:
  GetResourcesRequest:
    members:
      - {name: PageSize, type: int, member: uint64}
      - {name: PageNumber, type: int, member: uint64, required: false}
  GetResourcesResponse:
    members:
      - {name: ResourceTagMappingList, type: list, member: ResourceTagMapping}
      - {name: HasMore, type: int, member: int64}
  ResourceTagMapping:
    usage: out
    members:
      - {name: Resource, type: string, member: string}
"#;
    let sources = [
        source(LOGS),
        ManifestSource {
            origin: "tag.yaml".into(),
            format: SourceFormat::Yaml,
            contents: yaml.into(),
        },
        source("{\"metadata\": {\"shortName\": \"broken\"}}"),
    ];
    let results = compile_all(&sources, None, &CompilerConfig::default());

    assert!(results[0].is_ok());
    let tag = results[1].as_ref().unwrap();
    let pagination = tag.actions[0].pagination.pagination().unwrap();
    assert!(matches!(&pagination.kind, PaginationKind::Paged { input } if input.to_string() == "PageNumber"));
    assert!(matches!(&pagination.has_more, HasMore::EqualsOne(f) if f.to_string() == "HasMore"));
    assert_eq!(tag.objects[0].fields[0].stored.to_string(), "UInt64");

    let err = results[2].as_ref().unwrap_err();
    assert_eq!(err.manifest, ManifestLabel::Origin("cls.json".into()));
}
