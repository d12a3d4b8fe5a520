use std::env;
use std::path::Path;
use std::process::Command;

const LLVM_PREFIX_VAR: &str = "LLVM_SYS_180_PREFIX";

/// `llvm-config` for LLVM 18, preferring Homebrew's keg on macOS
fn llvm_config() -> &'static str {
    if cfg!(target_os = "macos") {
        for candidate in [
            "/opt/homebrew/opt/llvm@18/bin/llvm-config",
            "/usr/local/opt/llvm@18/bin/llvm-config",
        ] {
            if Path::new(candidate).exists() {
                return candidate;
            }
        }
    }
    "llvm-config-18"
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed={}", LLVM_PREFIX_VAR);

    if let Ok(prefix) = env::var(LLVM_PREFIX_VAR) {
        println!("cargo:rustc-env={}={}", LLVM_PREFIX_VAR, prefix);
    } else {
        match Command::new(llvm_config()).arg("--prefix").output() {
            Ok(output) if output.status.success() => {
                let prefix = String::from_utf8_lossy(&output.stdout).trim().to_string();
                println!("cargo:rustc-env={}={}", LLVM_PREFIX_VAR, prefix);
            }
            _ => {
                println!("cargo:warning=octa needs LLVM 18 (llvm-config-18 was not found).");
                println!("cargo:warning=Install llvm@18 (Homebrew) or llvm-18-dev (apt), or set {}.", LLVM_PREFIX_VAR);
            }
        }
    }

    if cfg!(target_os = "macos") {
        println!("cargo:rustc-link-lib=c++");
        println!("cargo:rustc-link-search=/opt/homebrew/lib");
        println!("cargo:rustc-link-search=/usr/local/lib");
    } else if cfg!(target_os = "linux") {
        println!("cargo:rustc-link-lib=stdc++");
    }
}
