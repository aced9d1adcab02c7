// src/backend/utils/log.rs
// Thin logging shim: debug print inside the canister, stdout/stderr in
// native builds (unit tests run the services natively).

#[cfg(target_arch = "wasm32")]
pub fn info(msg: impl AsRef<str>) {
    ic_cdk::println!("INFO: {}", msg.as_ref());
}

#[cfg(not(target_arch = "wasm32"))]
pub fn info(msg: impl AsRef<str>) {
    println!("INFO: {}", msg.as_ref());
}

#[cfg(target_arch = "wasm32")]
pub fn error(msg: impl AsRef<str>) {
    ic_cdk::eprintln!("ERROR: {}", msg.as_ref());
}

#[cfg(not(target_arch = "wasm32"))]
pub fn error(msg: impl AsRef<str>) {
    eprintln!("ERROR: {}", msg.as_ref());
}
