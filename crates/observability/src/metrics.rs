//! Remote write 指标记录模块
//!
//! 所有指标以 `remote_storage_` 为前缀；未安装 recorder 时调用为空操作。

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// 样本被丢弃的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// 队列已满
    QueueFull,
    /// 被 write relabel 规则丢弃
    Relabel,
    /// 队列已停止
    Stopped,
    /// 队列 worker 意外关闭
    Closed,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QueueFull => "queue_full",
            Self::Relabel => "relabel",
            Self::Stopped => "stopped",
            Self::Closed => "closed",
        }
    }
}

/// 注册指标描述
pub fn describe_metrics() {
    describe_counter!(
        "remote_storage_samples_appended_total",
        "Samples handed to the remote storage fan-out"
    );
    describe_counter!(
        "remote_storage_samples_dropped_total",
        "Samples dropped by a queue before delivery"
    );
    describe_counter!(
        "remote_storage_samples_sent_total",
        "Samples delivered by a queue's client"
    );
    describe_counter!(
        "remote_storage_send_failures_total",
        "Samples in batches the client failed to send"
    );
    describe_counter!(
        "remote_storage_reconfigurations_total",
        "Remote write reconfiguration attempts"
    );
    describe_gauge!(
        "remote_storage_active_queues",
        "Queues in the active remote write set"
    );
}

/// 记录一次 append 调用
pub fn record_sample_appended() {
    counter!("remote_storage_samples_appended_total").increment(1);
}

/// 记录队列丢弃的样本
pub fn record_sample_dropped(queue: &str, reason: DropReason) {
    counter!(
        "remote_storage_samples_dropped_total",
        "queue" => queue.to_string(),
        "reason" => reason.as_str()
    )
    .increment(1);
}

/// 记录成功发送的样本数
pub fn record_samples_sent(queue: &str, count: u64) {
    counter!("remote_storage_samples_sent_total", "queue" => queue.to_string()).increment(count);
}

/// 记录发送失败的样本数
pub fn record_send_failure(queue: &str, count: u64) {
    counter!("remote_storage_send_failures_total", "queue" => queue.to_string()).increment(count);
}

/// 记录重新配置结果
pub fn record_reconfiguration(success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("remote_storage_reconfigurations_total", "status" => status).increment(1);
}

/// 记录当前活跃队列数
pub fn record_active_queues(count: usize) {
    gauge!("remote_storage_active_queues").set(count as f64);
}
