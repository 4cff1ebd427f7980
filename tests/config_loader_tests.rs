use applied_ai::config::{ConfigError, ConfigLoader};
use std::{
    env, fs,
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;

const MANAGED_VARS: &[&str] = &[
    "APPLIED_AI_PROFILE",
    "APPLIED_AI_API_BIND_ADDR",
    "APPLIED_AI_LOG_LEVEL",
    "APPLIED_AI_ADMIN_TOKEN",
    "APPLIED_AI_ADMIN_TOKENS",
    "APPLIED_AI_MAILERLITE_API_KEY",
    "APPLIED_AI_MAILERLITE_GROUPS_CACHE_TTL_SECONDS",
    "APPLIED_AI_CORS_ALLOWED_ORIGINS",
    "APPLIED_AI_SPACES_BUCKET",
    "APPLIED_AI_POSTMARK_SERVER_TOKEN",
    "APPLIED_AI_CONTACT_FROM_ADDRESS",
    "APPLIED_AI_CONTACT_RECIPIENTS",
];

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn clear_env() {
    for var in MANAGED_VARS {
        unsafe {
            env::remove_var(var);
        }
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    let path = dir.path().join(name);
    fs::write(path, contents).unwrap();
}

#[test]
fn loads_defaults_when_no_env_present() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load().expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:8000");
    assert_eq!(cfg.mailerlite.groups_cache_ttl_seconds, 600);
    assert_eq!(cfg.storage.presign_expires_seconds, 300);
    assert_eq!(cfg.search.embedding_model, "text-embedding-3-small");
    cfg.bind_addr().expect("default bind addr parses");
    clear_env();
}

#[test]
fn layered_env_files_apply_in_order() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "APPLIED_AI_API_BIND_ADDR=127.0.0.1:3000\n");
    write_env_file(
        &temp_dir,
        ".env.test",
        "APPLIED_AI_API_BIND_ADDR=192.168.0.10:5000\nAPPLIED_AI_SPACES_BUCKET=test-bucket\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test.local",
        "APPLIED_AI_API_BIND_ADDR=10.0.0.5:6000\n",
    );

    // Select profile via .env.local before profile-specific files load.
    write_env_file(
        &temp_dir,
        ".env.local",
        "APPLIED_AI_PROFILE=test\nAPPLIED_AI_API_BIND_ADDR=127.0.0.1:4000\n",
    );

    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load().expect("config loads with layered env files");

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.api_bind_addr, "10.0.0.5:6000");
    assert_eq!(cfg.storage.bucket.as_deref(), Some("test-bucket"));
    clear_env();
}

#[test]
fn os_environment_has_highest_precedence() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "APPLIED_AI_API_BIND_ADDR=127.0.0.1:3000\nAPPLIED_AI_MAILERLITE_GROUPS_CACHE_TTL_SECONDS=60\n",
    );

    unsafe {
        env::set_var("APPLIED_AI_API_BIND_ADDR", "0.0.0.0:9090");
    }

    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load().expect("config loads with env override");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:9090");
    assert_eq!(cfg.mailerlite.groups_cache_ttl_seconds, 60);

    clear_env();
}

#[test]
fn admin_tokens_and_origins_parse_as_lists() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "APPLIED_AI_PROFILE=production\nAPPLIED_AI_ADMIN_TOKENS=alpha, beta,,\nAPPLIED_AI_CORS_ALLOWED_ORIGINS=https://a.example,https://b.example\n",
    );

    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load().expect("production config loads with tokens");

    assert_eq!(cfg.admin_tokens, vec!["alpha".to_string(), "beta".to_string()]);
    assert_eq!(cfg.cors_allowed_origins.len(), 2);
    clear_env();
}

#[test]
fn contact_email_settings_load_from_env_files() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "APPLIED_AI_POSTMARK_SERVER_TOKEN=pm-token\nAPPLIED_AI_CONTACT_FROM_ADDRESS=site@applied.example\nAPPLIED_AI_CONTACT_RECIPIENTS=owner@applied.example, sales@applied.example\n",
    );

    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let cfg = loader.load().expect("email settings load");
    assert_eq!(cfg.email.postmark_server_token.as_deref(), Some("pm-token"));
    assert_eq!(cfg.email.postmark_api_base, "https://api.postmarkapp.com");
    assert_eq!(
        cfg.email.contact_recipients,
        vec!["owner@applied.example".to_string(), "sales@applied.example".to_string()]
    );

    write_env_file(&temp_dir, ".env", "APPLIED_AI_POSTMARK_SERVER_TOKEN=pm-token\n");
    let err = loader.load().expect_err("token alone cannot deliver");
    assert!(matches!(err, ConfigError::IncompleteEmailConfig));
    clear_env();
}

#[test]
fn production_profile_without_admin_tokens_fails() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "APPLIED_AI_PROFILE=production\n");

    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let err = loader.load().expect_err("tokens are required in production");
    assert!(matches!(err, ConfigError::MissingAdminTokens));
    clear_env();
}

#[test]
fn invalid_bind_addr_returns_error() {
    let _guard = env_guard();
    clear_env();

    unsafe {
        env::set_var("APPLIED_AI_API_BIND_ADDR", "not-an-addr");
    }
    let temp_dir = TempDir::new().unwrap();
    let loader = ConfigLoader::with_base_dir(PathBuf::from(temp_dir.path()));
    let err = loader.load().expect_err("invalid bind addr should fail");
    assert!(format!("{}", err).contains("invalid api bind address"));

    clear_env();
}
