//! Actionable recommendations for weak dimensions.

use super::score::HealthScore;
use super::{RepoSnapshot, display_number};

/// A dimension scoring below this gets targeted recommendations.
const WEAK_DIMENSION: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn emoji(self) -> &'static str {
        match self {
            Self::High => "🔴",
            Self::Medium => "🟡",
            Self::Low => "🟢",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub title: &'static str,
    pub description: String,
    pub priority: Priority,
    pub actions: &'static [&'static str],
}

impl Recommendation {
    fn new(
        title: &'static str,
        description: impl Into<String>,
        priority: Priority,
        actions: &'static [&'static str],
    ) -> Self {
        Self {
            title,
            description: description.into(),
            priority,
            actions,
        }
    }
}

fn activity(s: &RepoSnapshot, out: &mut Vec<Recommendation>) {
    if s.openrank.unwrap_or(0.0) < 10.0 {
        out.push(Recommendation::new(
            "提升项目影响力",
            "当前 OpenRank 值较低，建议通过多种方式提升项目曝光度和参与度",
            Priority::High,
            &[
                "在技术社区（如掘金、思否、知乎）发布项目介绍文章",
                "制作项目演示视频或教程",
                "积极参与相关技术话题讨论",
                "寻找合作项目，建立生态联系",
            ],
        ));
    }
    out.push(Recommendation::new(
        "定期发布更新",
        "保持项目活跃的关键是持续迭代",
        Priority::Medium,
        &[
            "制定发版计划，定期发布新版本",
            "及时修复 Bug 和处理安全问题",
            "定期更新文档和示例",
        ],
    ));
}

fn community(s: &RepoSnapshot, out: &mut Vec<Recommendation>) {
    if s.bus_factor < 3.0 {
        out.push(Recommendation::new(
            "培养更多核心贡献者",
            format!(
                "当前巴士因子仅为 {}，项目过于依赖少数人",
                display_number(s.bus_factor)
            ),
            Priority::High,
            &[
                "识别活跃的贡献者，主动邀请他们承担更多职责",
                "完善开发文档，降低贡献门槛",
                "建立 Mentor 机制，指导新贡献者",
                "逐步下放代码审查和合并权限",
            ],
        ));
    }
    if s.new_contributors < 2.0 {
        out.push(Recommendation::new(
            "吸引新贡献者",
            "新贡献者是社区持续发展的动力",
            Priority::High,
            &[
                "创建 'good first issue' 标签，标记适合新手的任务",
                "编写详细的 CONTRIBUTING.md 贡献指南",
                "对首次贡献的 PR 给予积极反馈和鼓励",
                "举办 Hackathon 或贡献者活动",
            ],
        ));
    }
    out.push(Recommendation::new(
        "建立社区沟通渠道",
        "良好的沟通能增强社区凝聚力",
        Priority::Medium,
        &[
            "创建 Discord/Slack 群组方便实时交流",
            "定期举办社区会议或直播",
            "建立邮件列表讨论重要决策",
            "在 README 中明确标注沟通渠道",
        ],
    ));
}

fn maintenance(s: &RepoSnapshot, out: &mut Vec<Recommendation>) {
    if s.merge_rate < 0.5 {
        out.push(Recommendation::new(
            "优化 PR 处理流程",
            format!(
                "当前 PR 合并率为 {:.1}%，建议优化处理效率",
                s.merge_rate * 100.0
            ),
            Priority::High,
            &[
                "设置 CI/CD 自动化检查，加速代码审查",
                "明确 PR 规范，使用 PR 模板",
                "定期清理过期的 PR",
                "考虑增加 Reviewer 数量",
            ],
        ));
    }
    if let Some(hours) = s.avg_response_time.filter(|h| *h > 72.0) {
        out.push(Recommendation::new(
            "提升 Issue 响应速度",
            format!("当前平均响应时间为 {:.1} 天，可以更快", hours / 24.0),
            Priority::Medium,
            &[
                "使用 Issue 模板规范问题报告",
                "设置 Bot 自动回复和分类",
                "建立值班机制，确保及时响应",
                "将常见问题整理到 FAQ 文档",
            ],
        ));
    }
    out.push(Recommendation::new(
        "完善自动化流程",
        "自动化能提升维护效率",
        Priority::Low,
        &[
            "配置 GitHub Actions 进行自动测试",
            "使用 Dependabot 自动更新依赖",
            "设置自动发布流程",
            "添加代码质量检查（如 SonarQube）",
        ],
    ));
}

fn growth(out: &mut Vec<Recommendation>) {
    out.push(Recommendation::new(
        "加强项目推广",
        "让更多人了解和使用项目",
        Priority::Medium,
        &[
            "撰写技术博客介绍项目特性和使用场景",
            "在技术大会上演讲或做 Workshop",
            "与相关项目建立合作关系",
            "优化 README 和文档，降低上手门槛",
        ],
    ));
    out.push(Recommendation::new(
        "建立用户反馈机制",
        "了解用户需求才能持续增长",
        Priority::Low,
        &[
            "定期收集用户反馈",
            "分析 Issue 中的常见需求",
            "建立功能投票机制",
            "发布用户调研问卷",
        ],
    ));
}

fn general() -> Vec<Recommendation> {
    vec![
        Recommendation::new(
            "保持良好势头",
            "项目健康状况良好，继续保持当前的运营策略",
            Priority::Low,
            &["持续关注社区动态", "定期回顾和优化流程", "保持文档更新"],
        ),
        Recommendation::new(
            "探索新机会",
            "在稳定的基础上寻求突破",
            Priority::Low,
            &["探索新的应用场景", "考虑参与开源基金会", "建立更广泛的生态合作"],
        ),
    ]
}

/// Recommendations for every dimension scoring under 60, ordered high
/// priority first. A project with no weak dimension gets general advice.
pub fn advise(snapshot: &RepoSnapshot, health: &HealthScore) -> Vec<Recommendation> {
    let mut out = Vec::new();
    if health.activity < WEAK_DIMENSION {
        activity(snapshot, &mut out);
    }
    if health.community < WEAK_DIMENSION {
        community(snapshot, &mut out);
    }
    if health.maintenance < WEAK_DIMENSION {
        maintenance(snapshot, &mut out);
    }
    if health.growth < WEAK_DIMENSION {
        growth(&mut out);
    }

    if out.is_empty() {
        return general();
    }

    // Stable, so recommendations keep dimension order within a priority.
    out.sort_by_key(|r| r.priority);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::score::score;

    #[test]
    fn strong_project_gets_general_advice() {
        let snapshot = RepoSnapshot {
            openrank: Some(250.0),
            activity: Some(90.0),
            participants: 3000.0,
            bus_factor: 25.0,
            new_contributors: 30.0,
            merge_rate: 0.9,
            avg_response_time: Some(10.0),
            stars: 50000.0,
            ..RepoSnapshot::default()
        };
        let recs = advise(&snapshot, &score(&snapshot));
        let titles: Vec<_> = recs.iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["保持良好势头", "探索新机会"]);
    }

    #[test]
    fn weak_project_is_sorted_by_priority() {
        let snapshot = RepoSnapshot {
            openrank: Some(1.0),
            activity: Some(2.0),
            participants: 4.0,
            bus_factor: 1.0,
            merge_rate: 0.2,
            avg_response_time: Some(200.0),
            stars: 12.0,
            ..RepoSnapshot::default()
        };
        let recs = advise(&snapshot, &score(&snapshot));
        let titles: Vec<_> = recs.iter().map(|r| r.title).collect();
        assert_eq!(
            titles,
            vec![
                "提升项目影响力",
                "培养更多核心贡献者",
                "吸引新贡献者",
                "优化 PR 处理流程",
                "定期发布更新",
                "建立社区沟通渠道",
                "提升 Issue 响应速度",
                "加强项目推广",
                "完善自动化流程",
                "建立用户反馈机制",
            ]
        );
        assert_eq!(recs[1].description, "当前巴士因子仅为 1，项目过于依赖少数人");
        assert_eq!(recs[3].description, "当前 PR 合并率为 20.0%，建议优化处理效率");
        assert_eq!(recs[6].description, "当前平均响应时间为 8.3 天，可以更快");
    }

    #[test]
    fn only_weak_dimensions_contribute() {
        let snapshot = RepoSnapshot {
            openrank: Some(80.0),
            activity: Some(30.0),
            participants: 600.0,
            bus_factor: 12.0,
            new_contributors: 20.0,
            merge_rate: 0.1,
            avg_response_time: Some(300.0),
            stars: 20000.0,
            ..RepoSnapshot::default()
        };
        let health = score(&snapshot);
        assert!(health.maintenance < 60.0);
        let recs = advise(&snapshot, &health);
        assert!(recs.iter().all(|r| matches!(
            r.title,
            "优化 PR 处理流程" | "提升 Issue 响应速度" | "完善自动化流程"
        )));
    }
}
