fn main(){
    let crate_dir = match std::env::var("CARGO_MANIFEST_DIR"){
        Ok(dir) => dir,
        Err(_) => return,
    };

    println!("cargo:rerun-if-changed=src/ffi/mod.rs");

    let mut config = cbindgen::Config::default();
    config.language = cbindgen::Language::C;
    config.include_guard = Some("PEN_TRACKER_H".to_string());

    let include_dir = std::path::Path::new(&crate_dir).join("include");
    if let Err(e) = std::fs::create_dir_all(&include_dir){
        println!("cargo:warning=cannot create {}: {}", include_dir.display(), e);
        return;
    }

    //header is a convenience for C callers; never fail the build over it
    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) =>{
            bindings.write_to_file(include_dir.join("pen_tracker.h"));
        }
        Err(e) =>{
            println!("cargo:warning=header generation failed: {}", e);
        }
    }
}
