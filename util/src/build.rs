macro_rules! env_or_none {
    ($name:ident, $env:literal) => {
        #[allow(dead_code)]
        pub const $name: &str = match option_env!($env) {
            Some(val) => val,
            None => "<none>",
        };
    };
}

pub const PACKAGE: &str = "loralink";
env_or_none!(VERSION, "VERGEN_BUILD_SEMVER");
env_or_none!(COMMIT_HASH, "VERGEN_GIT_SHA");
env_or_none!(BUILD_TIMESTAMP, "VERGEN_BUILD_TIMESTAMP");
env_or_none!(RUSTC_COMMIT_HASH, "VERGEN_RUSTC_COMMIT_HASH");

/// One-line build identification for startup logs.
pub fn build_info() -> String {
    format!(
        "{} {} (commit {}, built {}, rustc {})",
        PACKAGE, VERSION, COMMIT_HASH, BUILD_TIMESTAMP, RUSTC_COMMIT_HASH
    )
}
