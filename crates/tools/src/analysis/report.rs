//! Markdown rendering of analysis results.

use super::advice::Recommendation;
use super::diagnosis::Diagnosis;
use super::{Analysis, display_number, display_optional};
use std::fmt::Write;

/// Title fragment the fallback answer looks for.
pub const HEALTH_REPORT_MARKER: &str = "健康度分析报告";
pub const DIAGNOSIS_REPORT_MARKER: &str = "诊断报告";

pub fn health_report(repo: &str, analysis: &Analysis) -> String {
    let h = &analysis.health;
    let s = &analysis.snapshot;

    let mut out = format!(
        "## 📊 {repo} {HEALTH_REPORT_MARKER}\n\n\
         ### 综合评分: {:.1}/100\n\n\
         | 维度 | 评分 |\n\
         |------|------|\n\
         | 🔥 活跃度 | {:.1} |\n\
         | 👥 社区健康 | {:.1} |\n\
         | 🔧 维护响应 | {:.1} |\n\
         | 📈 增长趋势 | {:.1} |\n\n\
         ### 关键指标\n\
         - **OpenRank**: {}\n\
         - **活跃度**: {}\n\
         - **参与者数**: {}\n\
         - **巴士因子**: {}\n\n\
         ### 评估摘要\n\
         {}\n",
        h.overall,
        h.activity,
        h.community,
        h.maintenance,
        h.growth,
        display_optional(s.openrank),
        display_optional(s.activity),
        display_number(s.participants),
        display_number(s.bus_factor),
        h.summary,
    );

    if !h.highlights.is_empty() {
        out.push_str("\n### ✅ 亮点\n");
        for item in &h.highlights {
            let _ = writeln!(out, "- {item}");
        }
    }
    if !h.concerns.is_empty() {
        out.push_str("\n### ⚠️ 需关注\n");
        for item in &h.concerns {
            let _ = writeln!(out, "- {item}");
        }
    }
    out
}

pub fn diagnosis_report(repo: &str, diagnosis: &Diagnosis) -> String {
    let mut out = format!(
        "## 🔍 {repo} 问题{DIAGNOSIS_REPORT_MARKER}\n\n**严重程度**: {} {}\n\n### 发现的问题\n",
        diagnosis.severity.emoji(),
        diagnosis.severity.label(),
    );

    if diagnosis.issues.is_empty() {
        out.push_str("- ✅ 暂未发现明显问题\n");
    }
    for issue in &diagnosis.issues {
        let _ = writeln!(out, "- ❌ {issue}");
    }

    out.push_str("\n### 潜在风险\n");
    if diagnosis.risks.is_empty() {
        out.push_str("- ✅ 暂未发现潜在风险\n");
    }
    for risk in &diagnosis.risks {
        let _ = writeln!(out, "- ⚠️ {risk}");
    }
    out
}

pub fn advice_report(repo: &str, recommendations: &[Recommendation]) -> String {
    if recommendations.is_empty() {
        return format!("仓库 {repo} 目前状况良好，暂无特别建议。");
    }

    let mut out = format!("## 💡 {repo} 改进建议\n\n");
    for rec in recommendations {
        let _ = write!(
            out,
            "### {} {}\n{}\n\n",
            rec.priority.emoji(),
            rec.title,
            rec.description
        );
        if !rec.actions.is_empty() {
            out.push_str("**具体行动:**\n");
            for action in rec.actions {
                let _ = writeln!(out, "- {action}");
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::advice::Priority;
    use crate::analysis::diagnosis::Severity;
    use crate::analysis::{RepoSnapshot, score};

    #[test]
    fn health_report_layout() {
        let snapshot = RepoSnapshot {
            openrank: Some(48.5),
            activity: Some(24.0),
            participants: 320.0,
            bus_factor: 6.0,
            ..RepoSnapshot::default()
        };
        let analysis = Analysis {
            health: score(&snapshot),
            snapshot,
        };
        let report = health_report("apache/dubbo", &analysis);

        assert!(report.starts_with("## 📊 apache/dubbo 健康度分析报告\n\n### 综合评分: "));
        assert!(report.contains("| 🔥 活跃度 | 69.1 |"));
        assert!(report.contains("- **OpenRank**: 48.5\n"));
        assert!(report.contains("- **参与者数**: 320\n"));
        assert!(report.contains("### 评估摘要\n"));
        assert!(report.contains("\n### ⚠️ 需关注\n"));
    }

    #[test]
    fn clean_diagnosis_report() {
        let diagnosis = Diagnosis {
            issues: vec![],
            risks: vec![],
            severity: Severity::Low,
        };
        let report = diagnosis_report("apache/dubbo", &diagnosis);
        assert_eq!(
            report,
            "## 🔍 apache/dubbo 问题诊断报告\n\n**严重程度**: 🟢 LOW\n\n### 发现的问题\n\
             - ✅ 暂未发现明显问题\n\n### 潜在风险\n- ✅ 暂未发现潜在风险\n"
        );
    }

    #[test]
    fn diagnosis_report_lists_findings() {
        let diagnosis = Diagnosis {
            issues: vec!["近期没有新贡献者加入".into()],
            risks: vec!["社区可能对新人不够友好".into()],
            severity: Severity::High,
        };
        let report = diagnosis_report("tiny/project", &diagnosis);
        assert!(report.contains("**严重程度**: 🔴 HIGH"));
        assert!(report.contains("- ❌ 近期没有新贡献者加入\n"));
        assert!(report.contains("- ⚠️ 社区可能对新人不够友好\n"));
    }

    #[test]
    fn advice_report_layout() {
        let recs = vec![Recommendation {
            title: "吸引新贡献者",
            description: "新贡献者是社区持续发展的动力".into(),
            priority: Priority::High,
            actions: &["编写详细的 CONTRIBUTING.md 贡献指南"],
        }];
        assert_eq!(
            advice_report("tiny/project", &recs),
            "## 💡 tiny/project 改进建议\n\n### 🔴 吸引新贡献者\n新贡献者是社区持续发展的动力\n\n\
             **具体行动:**\n- 编写详细的 CONTRIBUTING.md 贡献指南\n\n"
        );
        assert_eq!(
            advice_report("tiny/project", &[]),
            "仓库 tiny/project 目前状况良好，暂无特别建议。"
        );
    }
}
