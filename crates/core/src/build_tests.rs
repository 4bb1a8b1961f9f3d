// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    success   = { "SUCCESS",   Some(BuildStatus::Success) },
    unstable  = { "UNSTABLE",  Some(BuildStatus::Unstable) },
    not_built = { "NOT_BUILT", Some(BuildStatus::NotBuilt) },
    failure   = { "FAILURE",   Some(BuildStatus::Failure) },
    aborted   = { "ABORTED",   Some(BuildStatus::Aborted) },
    lowercase = { "success",   Some(BuildStatus::Success) },
    unknown   = { "BOGUS",     None },
    empty     = { "",          None },
)]
fn from_result(result: &str, expected: Option<BuildStatus>) {
    assert_eq!(BuildStatus::from_result(result), expected);
}

#[yare::parameterized(
    running  = { BuildStatus::Running,  false },
    success  = { BuildStatus::Success,  false },
    expired  = { BuildStatus::Expired,  false },
    unstable = { BuildStatus::Unstable, true },
    notbuilt = { BuildStatus::NotBuilt, true },
    failure  = { BuildStatus::Failure,  true },
    aborted  = { BuildStatus::Aborted,  true },
)]
fn failed_family(status: BuildStatus, failed: bool) {
    assert_eq!(status.is_failed(), failed);
}

mod properties {
    use super::*;
    use crate::test_support::strategies::arb_build_status;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn status_serializes_like_display(status in arb_build_status()) {
            let json = serde_json::to_string(&status).unwrap();
            prop_assert_eq!(json, format!("\"{}\"", status));
        }
    }
}

#[test]
fn build_uses_camel_case_fields() {
    let build = Build::builder().job_name("seed").hash("h1").number(7).build();
    let json = serde_json::to_value(&build).unwrap();
    assert_eq!(json["jobName"], "seed");
    assert_eq!(json["number"], 7);
    assert_eq!(json["status"], "running");
    assert!(json.get("createTime").is_none());
}

#[test]
fn matches_requires_both_name_and_hash() {
    let build = Build::new("job", "h1");
    assert!(build.matches("job", "h1"));
    assert!(!build.matches("job", "h2"));
    assert!(!build.matches("other", "h1"));
}
