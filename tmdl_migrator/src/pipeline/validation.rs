use crate::logging::codes;

/// Check that every stage's codes are registered before a run starts
pub fn validate_pipeline() -> Result<(), String> {
    crate::log_debug!("Validating pipeline configuration");

    crate::file_processor::init_file_processor_logging()?;

    let stage_codes = [
        codes::document::NO_PARTITION_MARKER,
        codes::document::NO_SOURCE_BLOCK,
        codes::rewrite::UNBOUNDED_CALL,
        codes::rewrite::TOO_MANY_CALL_SITES,
        codes::rewrite::UNRECOGNIZED_SHAPE,
        codes::write::BACKUP_FAILED,
        codes::write::OVERWRITE_FAILED,
    ];

    for code in &stage_codes {
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "Pipeline code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    crate::log_success!(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Pipeline validation succeeded",
        "codes_checked" => stage_codes.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_validate_pipeline() {
        let _ = crate::logging::init_global_logging();
        assert!(super::validate_pipeline().is_ok());
    }
}
