//! Rule-based problem and risk detection.

use super::RepoSnapshot;
use crate::opendigger::MetricSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Rising,
    Stable,
    Declining,
}

/// Compare the mean of the first half of the series with the second half.
/// Fewer than three points, or a zero first half, is `Stable`.
pub fn classify_trend(values: &[f64]) -> Trend {
    if values.len() < 3 {
        return Trend::Stable;
    }

    let mid = values.len() / 2;
    let (first, second) = values.split_at(mid);
    let first_avg = first.iter().sum::<f64>() / first.len() as f64;
    let second_avg = second.iter().sum::<f64>() / second.len() as f64;

    if first_avg == 0.0 {
        return Trend::Stable;
    }

    let change = (second_avg - first_avg) / first_avg;
    if change > 0.1 {
        Trend::Rising
    } else if change < -0.1 {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

fn declining(series: &MetricSeries) -> bool {
    classify_trend(&series.values()) == Trend::Declining
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Low => "🟢",
            Self::Medium => "🟡",
            Self::High => "🔴",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnosis {
    pub issues: Vec<String>,
    pub risks: Vec<String>,
    pub severity: Severity,
}

#[derive(Default)]
struct Findings {
    issues: Vec<String>,
    risks: Vec<String>,
}

impl Findings {
    fn issue(&mut self, text: impl Into<String>) {
        self.issues.push(text.into());
    }

    fn risk(&mut self, text: impl Into<String>) {
        self.risks.push(text.into());
    }
}

fn percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

fn activity(s: &RepoSnapshot, f: &mut Findings) {
    let openrank = s.openrank.unwrap_or(0.0);
    if openrank < 5.0 {
        f.issue("OpenRank 值较低，项目影响力有限");
        f.risk("项目可能难以吸引新贡献者");
    } else if openrank < 20.0 {
        f.risk("OpenRank 处于中等水平，有提升空间");
    }

    if s.activity.unwrap_or(0.0) < 5.0 {
        f.issue("月度活跃度较低，社区参与不活跃");
    }

    if declining(&s.openrank_history) {
        f.issue("OpenRank 呈下降趋势，需要关注");
        f.risk("如果趋势持续，项目影响力会进一步下降");
    }
}

fn community(s: &RepoSnapshot, f: &mut Findings) {
    let bus_factor = s.bus_factor as i64;
    if s.bus_factor < 2.0 {
        f.issue(format!("巴士因子仅为 {bus_factor}，项目严重依赖单一贡献者"));
        f.risk("核心贡献者离开可能导致项目停滞");
    } else if s.bus_factor < 3.0 {
        f.risk(format!("巴士因子为 {bus_factor}，建议培养更多核心贡献者"));
    }

    if s.participants < 10.0 {
        f.issue("参与者数量较少，社区规模有限");
    } else if s.participants < 50.0 {
        f.risk("社区规模中等，有增长空间");
    }

    if s.new_contributors == 0.0 {
        f.issue("近期没有新贡献者加入");
        f.risk("社区可能对新人不够友好");
    } else if s.new_contributors < 2.0 {
        f.risk("新贡献者增长缓慢");
    }
}

fn maintenance(s: &RepoSnapshot, f: &mut Findings) {
    if s.merge_rate < 0.3 {
        f.issue(format!("PR 合并率较低 ({})，可能存在积压", percent(s.merge_rate)));
        f.risk("贡献者可能因 PR 长期未处理而流失");
    } else if s.merge_rate < 0.5 {
        f.risk(format!("PR 合并率为 {}，有优化空间", percent(s.merge_rate)));
    }

    if let Some(hours) = s.avg_response_time {
        let days = hours / 24.0;
        if hours > 168.0 {
            f.issue(format!("Issue 平均响应时间超过 {days:.1} 天，响应较慢"));
        } else if hours > 72.0 {
            f.risk(format!("Issue 平均响应时间为 {days:.1} 天，可以更快"));
        }
    }

    if s.avg_resolution_time.is_some_and(|hours| hours > 720.0) {
        f.issue("Issue 平均解决时间超过一个月");
    }
}

fn growth(s: &RepoSnapshot, f: &mut Findings) {
    if s.new_contributors == 0.0 {
        f.issue("近期没有新贡献者，增长停滞");
    }

    if declining(&s.stars_history) {
        f.risk("Star 增长放缓，项目关注度下降");
    }

    if declining(&s.activity_history) {
        f.issue("活跃度呈下降趋势");
        f.risk("如果趋势持续，项目可能逐渐沉寂");
    }
}

/// Run every dimension's rules in order: activity, community,
/// maintenance, growth.
pub fn diagnose(snapshot: &RepoSnapshot) -> Diagnosis {
    let mut findings = Findings::default();
    activity(snapshot, &mut findings);
    community(snapshot, &mut findings);
    maintenance(snapshot, &mut findings);
    growth(snapshot, &mut findings);

    let severe = findings
        .issues
        .iter()
        .any(|i| i.contains("严重") || i.contains("高风险"));
    let severity = if findings.issues.len() >= 5 || severe {
        Severity::High
    } else if findings.issues.len() >= 3 {
        Severity::Medium
    } else {
        Severity::Low
    };

    Diagnosis {
        issues: findings.issues,
        risks: findings.risks,
        severity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> MetricSeries {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("2024-{:02}", i + 1), *v))
            .collect()
    }

    fn healthy() -> RepoSnapshot {
        RepoSnapshot {
            openrank: Some(48.5),
            activity: Some(24.0),
            participants: 320.0,
            new_contributors: 12.0,
            bus_factor: 6.0,
            merge_rate: 0.75,
            avg_response_time: Some(20.0),
            avg_resolution_time: Some(100.0),
            stars: 40512.0,
            openrank_history: series(&[40.0, 42.0, 44.0, 46.0]),
            ..RepoSnapshot::default()
        }
    }

    #[test]
    fn trend_classification() {
        assert_eq!(classify_trend(&[1.0, 2.0]), Trend::Stable);
        assert_eq!(classify_trend(&[10.0, 10.0, 12.0, 13.0]), Trend::Rising);
        assert_eq!(classify_trend(&[3.0, 2.0, 1.0]), Trend::Declining);
        assert_eq!(classify_trend(&[10.0, 10.5, 10.2]), Trend::Stable);
        assert_eq!(classify_trend(&[0.0, 5.0, 9.0]), Trend::Stable);
    }

    #[test]
    fn healthy_project_has_no_issues() {
        let diagnosis = diagnose(&healthy());
        assert!(diagnosis.issues.is_empty());
        assert!(diagnosis.risks.is_empty());
        assert_eq!(diagnosis.severity, Severity::Low);
    }

    #[test]
    fn single_maintainer_is_high_severity() {
        let snapshot = RepoSnapshot {
            bus_factor: 1.0,
            ..healthy()
        };
        let diagnosis = diagnose(&snapshot);
        assert_eq!(diagnosis.issues, vec!["巴士因子仅为 1，项目严重依赖单一贡献者"]);
        assert_eq!(diagnosis.risks, vec!["核心贡献者离开可能导致项目停滞"]);
        assert_eq!(diagnosis.severity, Severity::High);
    }

    #[test]
    fn maintenance_wording() {
        let snapshot = RepoSnapshot {
            merge_rate: 0.2,
            avg_response_time: Some(200.0),
            avg_resolution_time: Some(800.0),
            ..healthy()
        };
        let diagnosis = diagnose(&snapshot);
        assert_eq!(
            diagnosis.issues,
            vec![
                "PR 合并率较低 (20.0%)，可能存在积压",
                "Issue 平均响应时间超过 8.3 天，响应较慢",
                "Issue 平均解决时间超过一个月",
            ]
        );
        assert_eq!(diagnosis.severity, Severity::Medium);
    }

    #[test]
    fn moderate_values_are_risks_only() {
        let snapshot = RepoSnapshot {
            openrank: Some(12.0),
            bus_factor: 2.0,
            participants: 30.0,
            new_contributors: 1.0,
            merge_rate: 0.4,
            avg_response_time: Some(96.0),
            ..healthy()
        };
        let diagnosis = diagnose(&snapshot);
        assert!(diagnosis.issues.is_empty());
        assert_eq!(
            diagnosis.risks,
            vec![
                "OpenRank 处于中等水平，有提升空间",
                "巴士因子为 2，建议培养更多核心贡献者",
                "社区规模中等，有增长空间",
                "新贡献者增长缓慢",
                "PR 合并率为 40.0%，有优化空间",
                "Issue 平均响应时间为 4.0 天，可以更快",
            ]
        );
    }

    #[test]
    fn declining_histories() {
        let snapshot = RepoSnapshot {
            openrank_history: series(&[30.0, 25.0, 20.0, 15.0]),
            activity_history: series(&[9.0, 8.0, 4.0]),
            stars_history: series(&[100.0, 60.0, 20.0]),
            ..healthy()
        };
        let diagnosis = diagnose(&snapshot);
        assert_eq!(
            diagnosis.issues,
            vec!["OpenRank 呈下降趋势，需要关注", "活跃度呈下降趋势"]
        );
        assert!(diagnosis.risks.contains(&"Star 增长放缓，项目关注度下降".to_string()));
    }
}
