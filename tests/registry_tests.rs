//! Registry construction tests against the fixture bank tables.
//!
//! The network is replaced by an in-memory transport serving the fixture
//! spreadsheet, and every test gets its own cache directory.

use norwegian_banks::bank::{BankLookup, Transport, TransportResponse};
use norwegian_banks::{BankRegistry, ErrorKind, Profile, RegistryConfig, RegistryError};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

const XLSX: &[u8] = include_bytes!("fixtures/bank_table.xlsx");
const DAY: Duration = Duration::from_secs(86_400);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// TRANSPORTS
// =============================================================================

/// Serves a fixed response and counts requests.
struct FixtureTransport {
    response: Result<TransportResponse, String>,
    calls: AtomicUsize,
    conditional_calls: AtomicUsize,
}

impl FixtureTransport {
    fn serving(body: &[u8]) -> Self {
        Self::replying(Ok(TransportResponse::ok(body)))
    }

    fn offline() -> Self {
        Self::replying(Err("connection refused".to_string()))
    }

    fn replying(response: Result<TransportResponse, String>) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
            conditional_calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for FixtureTransport {
    fn get(
        &self,
        _url: &str,
        if_modified_since: Option<&str>,
    ) -> Result<TransportResponse, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if if_modified_since.is_some() {
            self.conditional_calls.fetch_add(1, Ordering::SeqCst);
        }
        self.response.clone().map_err(RegistryError::Network)
    }
}

fn config(dir: &TempDir) -> RegistryConfig {
    RegistryConfig::default().with_cache_dir(dir.path())
}

fn build(dir: &TempDir) -> BankRegistry {
    init_tracing();
    BankRegistry::with_transport(config(dir), &FixtureTransport::serving(XLSX)).unwrap()
}

fn backdate(path: &Path, by: Duration) {
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::now() - by)
        .unwrap();
}

fn mtime(path: &Path) -> SystemTime {
    fs::metadata(path).unwrap().modified().unwrap()
}

// =============================================================================
// LOOKUPS
// =============================================================================

#[test]
fn test_sample_accounts_resolve_and_validate() {
    let dir = tempfile::tempdir().unwrap();
    let registry = build(&dir);

    for (bank_code, account) in [
        ("DNBANOKK", "15942287248"),
        ("NDEANOKK", "61050659274"),
        ("SPSONO22", "30002779419"),
    ] {
        assert!(registry.validate(account), "{}", account);
        assert_eq!(
            registry.bank_for_account_number(account).unwrap().bank_code,
            bank_code
        );
    }
}

#[test]
fn test_checksum_valid_but_unknown_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let registry = build(&dir);

    assert!(!registry.validate("12345678903"));
    assert!(!registry.validate_with("12345678903", true));
    assert!(registry.validate_with("12345678903", false));
}

#[test]
fn test_unknown_prefix_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let registry = build(&dir);

    assert_eq!(registry.bank_code_for_prefix("0000"), None);
    assert!(registry.bank_for_account_number("0000.00.00000").is_none());
    assert!(registry.bank("NOTABANK").is_none());
}

#[test]
fn test_all_prefixes_skip_header() {
    let dir = tempfile::tempdir().unwrap();
    let registry = build(&dir);
    let prefixes = registry.all_prefixes();

    assert_eq!(
        prefixes,
        vec!["1200", "1503", "1594", "6105", "3000", "6000", "4750", "3001"]
    );
    assert!(prefixes
        .iter()
        .all(|p| p.len() == 4 && p.bytes().all(|b| b.is_ascii_digit())));
    assert!(!prefixes.contains(&"Bank identifier"));
}

#[test]
fn test_numeric_cells_become_prefixes() {
    let dir = tempfile::tempdir().unwrap();
    let registry = build(&dir);

    assert_eq!(registry.bank_code_for_prefix("1503"), Some("DNBANOKK"));
    assert_eq!(registry.bank_code_for_prefix("6000"), Some("NDEANOKK"));
}

#[test]
fn test_all_banks_in_row_order() {
    let dir = tempfile::tempdir().unwrap();
    let registry = build(&dir);
    let banks = registry.all_banks();

    let codes: Vec<_> = banks.iter().map(|b| b.bank_code.as_str()).collect();
    assert_eq!(codes, vec!["DNBANOKK", "NDEANOKK", "SPSONO22", "n/a"]);

    let dnb = registry.bank("DNBANOKK").unwrap();
    assert_eq!(dnb.bank_name, "DNB Bank ASA");
    assert_eq!(dnb.prefixes, vec!["1200", "1503", "1594"]);

    let nordea = registry.bank("NDEANOKK").unwrap();
    assert_eq!(nordea.bank_name, "Nordea Bank Abp, filial i Norge");

    for bank in banks {
        assert!(!bank.bank_code.is_empty());
        assert!(!bank.bank_name.is_empty());
    }
}

#[test]
fn test_missing_bank_code_uses_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let registry = build(&dir);

    let bank = registry.bank_for_account_number("4750.00.00000").unwrap();
    assert_eq!(bank.bank_code, "n/a");
    assert_eq!(bank.bank_name, "Oppgjørsbank uten BIC");
}

#[test]
fn test_prefixes_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let registry = build(&dir);

    let mut listed = 0;
    for bank in registry.all_banks() {
        for prefix in &bank.prefixes {
            assert_eq!(
                registry.bank_code_for_prefix(prefix),
                Some(bank.bank_code.as_str())
            );
            listed += 1;
        }
    }
    assert_eq!(listed, registry.len());
    assert_eq!(registry.banks_by_code().len(), registry.all_banks().len());
}

#[test]
fn test_reads_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let registry = build(&dir);
    let before = registry.table().clone();

    for _ in 0..3 {
        assert!(registry.validate("1594.22.87248"));
        assert!(!registry.validate("1594.22.87249"));
        assert_eq!(registry.format_account_number("15942287248"), "1594.22.87248");
    }
    assert_eq!(registry.table(), &before);
}

// =============================================================================
// FETCHING AND CACHING
// =============================================================================

#[test]
fn test_second_construction_makes_no_request() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FixtureTransport::serving(XLSX);

    let first = BankRegistry::with_transport(config(&dir), &transport).unwrap();
    let second = BankRegistry::with_transport(config(&dir), &transport).unwrap();

    assert_eq!(transport.calls(), 1);
    assert_eq!(first.table(), second.table());
}

#[test]
fn test_parse_cache_written_next_to_source() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    BankRegistry::with_transport(config.clone(), &FixtureTransport::serving(XLSX)).unwrap();

    let cache_dir = config.cache_dir_for(mtime(&config.source_path()));
    assert!(cache_dir.join("banks").is_file());
    assert!(cache_dir.join("prefixToBankCode").is_file());
}

#[test]
fn test_parse_cache_served_without_source_parse() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    let original = BankRegistry::with_transport(config.clone(), &FixtureTransport::serving(XLSX))
        .unwrap();

    // Not a workbook any more, but the mtime still matches the cached parse
    let source = config.source_path();
    let modified = mtime(&source);
    fs::write(&source, vec![0u8; 16]).unwrap();
    fs::File::options()
        .write(true)
        .open(&source)
        .unwrap()
        .set_modified(modified)
        .unwrap();

    let cached = BankRegistry::with_transport(config, &FixtureTransport::offline()).unwrap();
    assert_eq!(cached.table(), original.table());
}

#[test]
fn test_stale_source_falls_back_when_offline() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    fs::write(config.source_path(), XLSX).unwrap();
    backdate(&config.source_path(), 2 * DAY);

    let transport = FixtureTransport::offline();
    let registry = BankRegistry::with_transport(config, &transport).unwrap();

    assert_eq!(transport.calls(), 1);
    assert_eq!(registry.bank_code_for_prefix("1594"), Some("DNBANOKK"));
}

#[test]
fn test_stale_source_revalidated_with_304() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    let source = config.source_path();
    fs::write(&source, XLSX).unwrap();
    backdate(&source, 2 * DAY);
    let before = mtime(&source);

    let transport = FixtureTransport::replying(Ok(TransportResponse::not_modified()));
    let registry = BankRegistry::with_transport(config, &transport).unwrap();

    assert_eq!(transport.conditional_calls.load(Ordering::SeqCst), 1);
    assert!(mtime(&source) > before);
    assert_eq!(fs::read(&source).unwrap(), XLSX);
    assert!(registry.validate("61050659274"));
}

#[test]
fn test_offline_without_source_is_network_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = BankRegistry::with_transport(config(&dir), &FixtureTransport::offline()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

#[test]
fn test_server_error_without_source_is_network_error() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FixtureTransport::replying(Ok(TransportResponse {
        status: 500,
        body: Vec::new(),
    }));

    let err = BankRegistry::with_transport(config(&dir), &transport).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

#[test]
fn test_garbage_source_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FixtureTransport::serving(b"<html>maintenance</html>");

    let config = config(&dir);
    let err = BankRegistry::with_transport(config.clone(), &transport).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(!config.source_path().exists());
}

#[test]
fn test_unparseable_refresh_keeps_good_copy() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    let original =
        BankRegistry::with_transport(config.clone(), &FixtureTransport::serving(XLSX)).unwrap();
    backdate(&config.source_path(), 2 * DAY);

    let maintenance = FixtureTransport::serving(b"<html>maintenance</html>");
    let refreshed = BankRegistry::with_transport(config.clone(), &maintenance).unwrap();

    assert_eq!(maintenance.calls(), 1);
    assert_eq!(refreshed.table(), original.table());
    assert_eq!(fs::read(config.source_path()).unwrap(), XLSX);

    let offline = BankRegistry::with_transport(config, &FixtureTransport::offline()).unwrap();
    assert_eq!(offline.table(), original.table());
}

#[test]
fn test_concurrent_construction_downloads_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    let transport = Arc::new(FixtureTransport::serving(XLSX));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let config = config.clone();
            let transport = Arc::clone(&transport);
            std::thread::spawn(move || {
                BankRegistry::with_transport(config, transport.as_ref())
                    .map(|r| r.len())
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 8);
    }
    assert_eq!(transport.calls(), 1);
}

#[test]
fn test_registry_shared_across_threads() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(build(&dir));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.validate("3000.27.79419"))
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

// =============================================================================
// PROFILES
// =============================================================================

#[test]
fn test_legacy_profile_drops_rows_without_bank_code() {
    let dir = tempfile::tempdir().unwrap();
    let config = Profile::Legacy.config().with_cache_dir(dir.path());

    let registry =
        BankRegistry::with_transport(config, &FixtureTransport::serving(XLSX)).unwrap();

    assert_eq!(registry.bank_code_for_prefix("4750"), None);
    assert_eq!(registry.len(), 7);
    assert!(registry.bank("n/a").is_none());
    assert!(registry.validate("15942287248"));
}

#[test]
fn test_profiles_do_not_share_files() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FixtureTransport::serving(XLSX);

    let current = BankRegistry::with_transport(config(&dir), &transport).unwrap();
    let legacy = BankRegistry::with_transport(
        Profile::Legacy.config().with_cache_dir(dir.path()),
        &transport,
    )
    .unwrap();

    assert_eq!(transport.calls(), 2);
    assert_eq!(current.len(), 8);
    assert_eq!(legacy.len(), 7);
}

#[cfg(feature = "source-csv")]
#[test]
fn test_csv_source_matches_spreadsheet() {
    use norwegian_banks::bank::SourceFormat;

    let csv_dir = tempfile::tempdir().unwrap();
    let csv_config = RegistryConfig::default()
        .with_cache_dir(csv_dir.path())
        .with_source_file_name("bank_table.csv")
        .with_source_format(SourceFormat::Csv);
    let csv = BankRegistry::with_transport(
        csv_config,
        &FixtureTransport::serving(include_bytes!("fixtures/bank_table.csv")),
    )
    .unwrap();

    let xlsx_dir = tempfile::tempdir().unwrap();
    assert_eq!(csv.table(), build(&xlsx_dir).table());
}
