use crate::config::Config;
use crate::llm::LLMClient;
use crate::research::{ResearchOutcome, ResearchRequest, run_research};

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// 时间跟踪作用域，同名阶段多次执行时累计耗时
#[derive(Debug, Clone)]
pub struct TimingScope {
    start_time: std::time::Instant,
    phase_start_times: HashMap<String, std::time::Instant>,
    phase_durations: HashMap<String, Duration>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: std::time::Instant::now(),
            phase_start_times: HashMap::new(),
            phase_durations: HashMap::new(),
        }
    }

    /// 开始一个新的阶段计时
    pub fn start_phase(&mut self, phase_name: &str) {
        self.phase_start_times
            .insert(phase_name.to_string(), std::time::Instant::now());
    }

    /// 结束一个阶段的计时，返回本次耗时
    pub fn end_phase(&mut self, phase_name: &str) -> Option<Duration> {
        let start_time = self.phase_start_times.remove(phase_name)?;
        let duration = start_time.elapsed();
        *self
            .phase_durations
            .entry(phase_name.to_string())
            .or_default() += duration;
        Some(duration)
    }

    /// 获取总执行时间
    pub fn get_total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 获取所有阶段的执行时间
    pub fn get_phase_durations(&self) -> &HashMap<String, Duration> {
        &self.phase_durations
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "总执行时间: {:.2}秒\n",
            self.get_total_duration().as_secs_f64()
        );

        if !self.phase_durations.is_empty() {
            report.push_str("\n各阶段执行时间:\n");
            let mut phases: Vec<_> = self.phase_durations.iter().collect();
            phases.sort_by(|a, b| b.1.cmp(a.1));
            for (phase, duration) in phases {
                report.push_str(&format!("- {}: {:.3}秒\n", phase, duration.as_secs_f64()));
            }
        }

        report
    }
}

/// 使用生产环境的LLM客户端执行一次调研
pub async fn launch(config: &Config, request: ResearchRequest) -> Result<ResearchOutcome> {
    let client = Arc::new(LLMClient::new(config.llm.clone())?);
    let outcome = run_research(client, config, request).await?;
    Ok(outcome)
}

/// 将调研结果渲染为终端输出：回答正文与编号的来源列表
pub fn render_outcome(outcome: &ResearchOutcome) -> String {
    let mut output = outcome.answer.trim_end().to_string();

    if !outcome.sources.is_empty() {
        output.push_str("\n\nSources:\n");
        for (index, source) in outcome.sources.iter().enumerate() {
            output.push_str(&format!(
                "[{}] {} - {}\n",
                index + 1,
                source.label,
                source.long_url
            ));
        }
    } else {
        output.push('\n');
    }

    output
}
