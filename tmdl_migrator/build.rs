// build.rs - compile-time limits generated from config/<profile>.toml
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

#[derive(serde::Deserialize)]
struct Profile {
    file_processing: FileProcessingLimits,
    rewrite: RewriteLimits,
    batch_processing: BatchProcessingLimits,
    logging: LoggingLimits,
}

#[derive(serde::Deserialize)]
struct FileProcessingLimits {
    max_file_size: u64,
    max_line_count: usize,
}

#[derive(serde::Deserialize)]
struct RewriteLimits {
    max_call_sites_per_block: usize,
    max_table_name_length: usize,
}

#[derive(serde::Deserialize)]
struct BatchProcessingLimits {
    max_worker_threads: usize,
    max_files_per_batch: usize,
}

#[derive(serde::Deserialize)]
struct LoggingLimits {
    log_buffer_size: usize,
    max_log_message_length: usize,
    max_log_events_per_file: usize,
}

/// Hard ceilings no profile may raise
const CEILING_FILE_SIZE: u64 = 1_000_000_000;
const CEILING_THREADS: usize = 64;
const PRODUCTION_FILE_SIZE: u64 = 50_000_000;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=TMDL_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=TMDL_CONFIG_DIR");

    let profile_name = env::var("TMDL_BUILD_PROFILE").unwrap_or_else(|_| "development".into());
    let config_dir = env::var("TMDL_CONFIG_DIR").unwrap_or_else(|_| "config".into());

    // config/ lives at the workspace root, one level above this crate
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let workspace_root = manifest_dir.parent().unwrap_or(manifest_dir.as_path());
    let profile_path = workspace_root
        .join(config_dir)
        .join(format!("{profile_name}.toml"));
    println!("cargo:rerun-if-changed={}", profile_path.display());

    let text = fs::read_to_string(&profile_path).unwrap_or_else(|e| {
        panic!("build profile {} unreadable: {e}", profile_path.display())
    });
    let profile: Profile = toml::from_str(&text)
        .unwrap_or_else(|e| panic!("build profile {} invalid: {e}", profile_path.display()));

    if let Err(problem) = check_limits(&profile, &profile_name) {
        panic!("build profile {}: {problem}", profile_path.display());
    }

    let out = PathBuf::from(env::var("OUT_DIR").unwrap()).join("constants.rs");
    fs::write(out, render(&profile, &profile_name)).unwrap();
}

fn check_limits(profile: &Profile, name: &str) -> Result<(), String> {
    let files = &profile.file_processing;
    let threads = profile.batch_processing.max_worker_threads;
    let logging = &profile.logging;

    if files.max_file_size > CEILING_FILE_SIZE {
        return Err(format!("max_file_size above {CEILING_FILE_SIZE}"));
    }
    if !(1..=CEILING_THREADS).contains(&threads) {
        return Err(format!("max_worker_threads must be 1..={CEILING_THREADS}"));
    }
    if profile.rewrite.max_call_sites_per_block == 0 {
        return Err("max_call_sites_per_block must be at least 1".into());
    }
    if logging.max_log_events_per_file > logging.log_buffer_size {
        return Err("max_log_events_per_file above log_buffer_size".into());
    }
    if name == "production" && files.max_file_size > PRODUCTION_FILE_SIZE {
        return Err(format!("production max_file_size above {PRODUCTION_FILE_SIZE}"));
    }
    Ok(())
}

fn render(profile: &Profile, name: &str) -> String {
    let sections: [(&str, Vec<(&str, &str, String)>); 4] = [
        (
            "file_processing",
            vec![
                ("MAX_FILE_SIZE", "u64", profile.file_processing.max_file_size.to_string()),
                ("MAX_LINE_COUNT", "usize", profile.file_processing.max_line_count.to_string()),
            ],
        ),
        (
            "rewrite",
            vec![
                ("MAX_CALL_SITES_PER_BLOCK", "usize", profile.rewrite.max_call_sites_per_block.to_string()),
                ("MAX_TABLE_NAME_LENGTH", "usize", profile.rewrite.max_table_name_length.to_string()),
            ],
        ),
        (
            "batch_processing",
            vec![
                ("MAX_WORKER_THREADS", "usize", profile.batch_processing.max_worker_threads.to_string()),
                ("MAX_FILES_PER_BATCH", "usize", profile.batch_processing.max_files_per_batch.to_string()),
            ],
        ),
        (
            "logging",
            vec![
                ("LOG_BUFFER_SIZE", "usize", profile.logging.log_buffer_size.to_string()),
                ("MAX_LOG_MESSAGE_LENGTH", "usize", profile.logging.max_log_message_length.to_string()),
                ("MAX_LOG_EVENTS_PER_FILE", "usize", profile.logging.max_log_events_per_file.to_string()),
            ],
        ),
    ];

    let mut code = format!("// Generated by build.rs from the `{name}` profile. Do not edit.\n\n");
    code.push_str("pub mod compile_time {\n");
    for (module, constants) in &sections {
        let _ = writeln!(code, "    pub mod {module} {{");
        for (constant, ty, value) in constants {
            let _ = writeln!(code, "        pub const {constant}: {ty} = {value};");
        }
        code.push_str("    }\n");
    }
    code.push_str("}\n");
    code
}
