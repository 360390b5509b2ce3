fn main() {
    println!("cargo:rerun-if-env-changed=IMAIL_CHAT_ID");
    println!("cargo:rerun-if-env-changed=IMAIL_BOT_TOKEN");
    println!("cargo:rerun-if-env-changed=IMAIL_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=IMAIL_WIFI_PASSWORD");

    // Host builds (tests, fuzzing) have no ESP-IDF environment to export.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
