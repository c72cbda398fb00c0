use std::env;

// ffmpeg-sys-next finds FFmpeg through pkg-config on Unix. On Windows it
// needs FFMPEG_DIR, which is easy to forget when FFmpeg comes from vcpkg.
fn main() {
    println!("cargo:rerun-if-env-changed=FFMPEG_DIR");
    println!("cargo:rerun-if-env-changed=VCPKG_ROOT");

    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") {
        return;
    }
    if env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    match env::var("VCPKG_ROOT") {
        Ok(root) => println!(
            "cargo:warning=FFMPEG_DIR is not set; with vcpkg it is usually {root}\\installed\\x64-windows"
        ),
        Err(_) => println!(
            "cargo:warning=FFMPEG_DIR is not set; point it at an FFmpeg install (e.g. from vcpkg)"
        ),
    }
}
