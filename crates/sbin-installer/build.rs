use time::OffsetDateTime;

fn main() {
    let now = OffsetDateTime::now_utc();
    let stamp = format!(
        "{:04}.{:02}.{:02}.{:02}{:02}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute()
    );
    println!("cargo:rustc-env=SBIN_INSTALLER_VERS={stamp}");
    println!("cargo:rerun-if-changed=build.rs");
}
