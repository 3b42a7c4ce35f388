fn main() {
    // The vendor library ships with the CTR-700 root filesystem; an override
    // location can be supplied for cross builds.
    if let Ok(dir) = std::env::var("CTR700DRV_LIB_DIR") {
        println!("cargo:rustc-link-search=native={dir}");
    }
    println!("cargo:rustc-link-lib=dylib=ctr700drv");
}
