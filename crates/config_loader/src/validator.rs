//! 配置校验模块
//!
//! 校验规则：
//! - remote_write name 唯一 (含默认名 `remote-<index>`)
//! - url 非空
//! - 队列参数 > 0
//! - external label 名称合法
//! - relabel 规则：regex 可编译、replace 需要 target_label

use std::collections::HashSet;

use contracts::{
    is_valid_label_name, ContractError, RelabelAction, RelabelConfig, RemoteStorageConfig,
    RemoteWriteConfig,
};
use regex::Regex;

/// 校验 RemoteStorageConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &RemoteStorageConfig) -> Result<(), ContractError> {
    validate_external_labels(config)?;
    validate_remote_names(config)?;
    for (idx, rw) in config.remote_write.iter().enumerate() {
        validate_remote_write(idx, rw)?;
    }
    Ok(())
}

/// 校验 external label 名称
fn validate_external_labels(config: &RemoteStorageConfig) -> Result<(), ContractError> {
    for (name, _) in config.global.external_labels.iter() {
        if !is_valid_label_name(name) {
            return Err(ContractError::config_validation(
                format!("global.external_labels.{name}"),
                "invalid label name",
            ));
        }
    }
    Ok(())
}

/// 校验 remote_write 名称唯一性
fn validate_remote_names(config: &RemoteStorageConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, rw) in config.remote_write.iter().enumerate() {
        let name = rw.display_name(idx);
        if name.is_empty() {
            return Err(ContractError::config_validation(
                format!("remote_write[{idx}].name"),
                "name cannot be empty",
            ));
        }
        if !seen.insert(name.clone()) {
            return Err(ContractError::config_validation(
                format!("remote_write[name={name}]"),
                "duplicate remote_write name",
            ));
        }
    }
    Ok(())
}

/// 校验单个 remote_write
fn validate_remote_write(idx: usize, rw: &RemoteWriteConfig) -> Result<(), ContractError> {
    if rw.url.trim().is_empty() {
        return Err(ContractError::config_validation(
            format!("remote_write[{idx}].url"),
            "url cannot be empty",
        ));
    }

    let queue = &rw.queue;
    for (field, value) in [
        ("capacity", queue.capacity as u64),
        ("max_samples_per_send", queue.max_samples_per_send as u64),
        ("batch_send_deadline_ms", queue.batch_send_deadline_ms),
    ] {
        if value == 0 {
            return Err(ContractError::config_validation(
                format!("remote_write[{idx}].queue.{field}"),
                format!("{field} must be > 0"),
            ));
        }
    }

    for (rule_idx, rule) in rw.write_relabel_configs.iter().enumerate() {
        validate_relabel_rule(rule).map_err(|message| {
            ContractError::config_validation(
                format!("remote_write[{idx}].write_relabel_configs[{rule_idx}]"),
                message,
            )
        })?;
    }
    Ok(())
}

/// 校验 relabel 规则
fn validate_relabel_rule(rule: &RelabelConfig) -> Result<(), String> {
    Regex::new(&rule.anchored_regex())
        .map_err(|e| format!("invalid regex '{}': {e}", rule.regex))?;

    if rule.action == RelabelAction::Replace {
        match rule.target_label.as_deref() {
            None | Some("") => return Err("replace requires target_label".to_string()),
            // Targets with `$` are expanded at relabel time
            Some(target) if !target.contains('$') && !is_valid_label_name(target) => {
                return Err(format!("invalid target_label '{target}'"));
            }
            Some(_) => {}
        }
    }

    for source in &rule.source_labels {
        if !is_valid_label_name(source) {
            return Err(format!("invalid source label '{source}'"));
        }
    }
    Ok(())
}
