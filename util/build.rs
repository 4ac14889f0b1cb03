use vergen::{
    vergen,
    Config,
};

fn main() {
    // outside a git checkout the git fields stay unset
    vergen(Config::default()).unwrap_or_else(|e| {
        println!("cargo:warning=vergen failed: {}", e);
    });
}
