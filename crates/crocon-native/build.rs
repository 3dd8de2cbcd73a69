fn main() {
    println!("cargo:rerun-if-env-changed=CROCON_LIB_DIR");

    let link_enabled = std::env::var("CARGO_FEATURE_LINK").is_ok();
    if link_enabled {
        if let Ok(dir) = std::env::var("CROCON_LIB_DIR") {
            println!("cargo:rustc-link-search=native={dir}");
        }
    }
}
