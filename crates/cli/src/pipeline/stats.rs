//! Pipeline statistics and metrics.

use std::time::Duration;

use remote_storage::QueueMetricsSnapshot;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Samples parsed from the input and handed to the remote storage
    pub samples_appended: u64,

    /// Input lines that were not valid samples
    pub parse_errors: u64,

    /// Configuration reloads applied successfully
    pub reloads_applied: u64,

    /// Configuration reloads rejected (old configuration kept)
    pub reloads_failed: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Final per-queue metrics, in configuration order
    pub queues: Vec<(String, QueueMetricsSnapshot)>,
}

impl PipelineStats {
    /// Samples appended per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.samples_appended as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Sum of every queue's sent count
    pub fn total_sent(&self) -> u64 {
        self.queues.iter().map(|(_, q)| q.sent_count).sum()
    }

    /// Sum of every queue's dropped count (full or closed queue)
    pub fn total_dropped(&self) -> u64 {
        self.queues.iter().map(|(_, q)| q.dropped_count).sum()
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Samples appended: {}", self.samples_appended);
        println!("   ├─ Parse errors: {}", self.parse_errors);
        println!("   ├─ Throughput: {:.2} samples/s", self.throughput());
        println!(
            "   └─ Reloads: {} applied, {} failed",
            self.reloads_applied, self.reloads_failed
        );

        if !self.queues.is_empty() {
            println!("\n📈 Remote Write Queues");
            for (name, q) in &self.queues {
                println!(
                    "   ├─ {}: sent={} failed={} dropped={} relabel_dropped={} pending={}",
                    name,
                    q.sent_count,
                    q.failed_count,
                    q.dropped_count,
                    q.relabel_dropped_count,
                    q.queue_len
                );
            }
            println!(
                "   └─ Total: sent={} dropped={}",
                self.total_sent(),
                self.total_dropped()
            );
        }

        println!();
    }
}
