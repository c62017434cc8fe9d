//! Config load validation tests for site-bench-config.
// crates/site-bench-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards and section validation.
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use site_bench_config::AuditSinkKind;
use site_bench_config::ConfigError;
use site_bench_config::SiteBenchConfig;
use site_bench_config::config_toml_example;
use site_bench_core::ComponentId;
use site_bench_core::Intensity;
use site_bench_core::ProfileId;
use site_bench_core::ProfileResolver;
use site_bench_core::RawBenchmarkRequest;
use site_bench_core::TestKind;
use site_bench_core::WorkloadBase;
use tempfile::NamedTempFile;
use tempfile::TempDir;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<SiteBenchConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

fn parse(content: &str) -> Result<SiteBenchConfig, ConfigError> {
    SiteBenchConfig::from_toml_str(content)
}

// ============================================================================
// SECTION: Load Guards
// ============================================================================

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    assert_invalid(SiteBenchConfig::load(Some(Path::new(&long_path))), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    assert_invalid(
        SiteBenchConfig::load(Some(Path::new(&long_component))),
        "config path component too long",
    )
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'#'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(SiteBenchConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(SiteBenchConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_rejects_missing_explicit_file() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    assert_invalid(SiteBenchConfig::load_or_default(Some(&path)), "config io error")
}

#[test]
fn load_records_source_path() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(b"[harness]\ndefault_intensity = 75\n").map_err(|err| err.to_string())?;
    let config = SiteBenchConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.source_path.as_deref() != Some(file.path()) {
        return Err("source path not recorded".to_string());
    }
    if config.harness.default_intensity != 75 {
        return Err("default_intensity not parsed".to_string());
    }
    Ok(())
}

// ============================================================================
// SECTION: Defaults and Example
// ============================================================================

#[test]
fn empty_config_uses_defaults() -> TestResult {
    let config = parse("").map_err(|err| err.to_string())?;
    let orchestrator = config.orchestrator_config().map_err(|err| err.to_string())?;
    if orchestrator.self_component != ComponentId::new("site-bench") {
        return Err("unexpected self component".to_string());
    }
    if orchestrator.default_intensity != Intensity::DEFAULT {
        return Err("unexpected default intensity".to_string());
    }
    if orchestrator.workloads != WorkloadBase::default() {
        return Err("unexpected workloads".to_string());
    }
    if config.audit.sink != AuditSinkKind::Stderr {
        return Err("unexpected audit sink".to_string());
    }
    Ok(())
}

#[test]
fn example_config_is_valid() -> TestResult {
    let config = parse(&config_toml_example()).map_err(|err| err.to_string())?;
    if config.profiles.len() != 2 {
        return Err("expected two example profiles".to_string());
    }
    config.typed_profiles().map_err(|err| err.to_string())?;
    Ok(())
}

#[test]
fn workload_overrides_are_partial() -> TestResult {
    let config = parse("[workloads.compute]\nhash_count = 7\n").map_err(|err| err.to_string())?;
    if config.workloads.compute.hash_count != 7 {
        return Err("override not applied".to_string());
    }
    if config.workloads.compute.math_iterations != WorkloadBase::default().compute.math_iterations {
        return Err("unspecified field lost its default".to_string());
    }
    Ok(())
}

#[test]
fn file_audit_sink_opens_configured_path() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("audit.jsonl");
    let content = format!("[audit]\nsink = \"file\"\npath = {:?}\n", path.display().to_string());
    let config = parse(&content).map_err(|err| err.to_string())?;
    config.build_audit_sink().map_err(|err| err.to_string())?;
    if !path.exists() {
        return Err("audit file not created".to_string());
    }
    Ok(())
}

// ============================================================================
// SECTION: Section Validation
// ============================================================================

#[test]
fn rejects_unknown_keys() -> TestResult {
    assert_invalid(parse("[harness]\nself = \"x\"\n"), "config parse error")?;
    assert_invalid(parse("[workloads.memory]\nelements = 3\n"), "config parse error")
}

#[test]
fn rejects_out_of_range_intensity() -> TestResult {
    assert_invalid(parse("[harness]\ndefault_intensity = 101\n"), "default_intensity")?;
    assert_invalid(parse("[harness]\ndefault_intensity = -1\n"), "default_intensity")
}

#[test]
fn rejects_invalid_self_component() -> TestResult {
    assert_invalid(parse("[harness]\nself_component = \"\"\n"), "harness.self_component")
}

#[test]
fn rejects_zero_workload_counts() -> TestResult {
    assert_invalid(
        parse("[workloads.storage_write]\ntable_rows = 0\n"),
        "workloads.storage_write.table_rows must be greater than zero",
    )
}

#[test]
fn rejects_file_sink_without_path() -> TestResult {
    assert_invalid(parse("[audit]\nsink = \"file\"\n"), "audit.path is required")
}

#[test]
fn rejects_zero_busy_timeout() -> TestResult {
    assert_invalid(parse("[store]\nbusy_timeout_ms = 0\n"), "busy_timeout_ms")
}

// ============================================================================
// SECTION: Profiles
// ============================================================================

const TWO_PROFILES: &str = r#"
[[profiles]]
id = "db"
name = "Storage"
tests = ["db_read", "db_write"]
components = ["object-cache"]

[[profiles]]
id = "db"
name = "Duplicate"
tests = ["cpu"]
"#;

#[test]
fn rejects_duplicate_profile_ids() -> TestResult {
    assert_invalid(parse(TWO_PROFILES), "duplicate profile id: db")
}

#[test]
fn rejects_profile_without_tests() -> TestResult {
    assert_invalid(
        parse("[[profiles]]\nid = \"p\"\nname = \"P\"\ntests = []\n"),
        "must select at least one test",
    )
}

#[test]
fn rejects_profile_with_unknown_test() -> TestResult {
    assert_invalid(
        parse("[[profiles]]\nid = \"p\"\nname = \"P\"\ntests = [\"gpu\"]\n"),
        "unknown test kind: gpu",
    )
}

#[test]
fn profiles_resolve_raw_requests() -> TestResult {
    let content = "[[profiles]]\nid = \"db\"\nname = \"Storage\"\ntests = [\"db_read\", \
                   \"db_write\"]\ncomponents = [\"object-cache\"]\n";
    let config = parse(content).map_err(|err| err.to_string())?;
    let profile = config.profile(&ProfileId::new("db")).ok_or("profile missing")?;
    if profile.tests != vec![TestKind::StorageRead, TestKind::StorageWrite] {
        return Err("aliases not resolved".to_string());
    }
    if config.profile(&ProfileId::new("missing")).is_some() {
        return Err("unexpected profile".to_string());
    }

    let raw = RawBenchmarkRequest {
        profile_id: Some("db".to_string()),
        ..RawBenchmarkRequest::default()
    };
    let request = raw.resolve(Some(&config)).map_err(|err| err.to_string())?;
    if !request.is_selected(TestKind::StorageWrite) || request.is_selected(TestKind::Compute) {
        return Err("profile tests not applied".to_string());
    }
    if !request.components().contains(&ComponentId::new("object-cache")) {
        return Err("profile components not applied".to_string());
    }
    Ok(())
}
