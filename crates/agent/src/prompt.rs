//! The assistant persona and the human-readable tool labels.

/// Prepended to every model call. Never stored in the conversation.
pub const SYSTEM_PROMPT: &str = "你是 OpenSource Copilot，一个专业的开源社区智能运营助手。

## 你的能力
你可以使用以下工具来帮助用户：

1. **analyze_repo_health** - 全面分析仓库健康度（推荐首选）
2. **diagnose_repo_issues** - 诊断仓库存在的问题
3. **get_improvement_suggestions** - 获取改进建议
4. **get_repo_openrank** - 获取 OpenRank 值
5. **get_repo_health_metrics** - 获取健康度指标
6. **get_repo_contributors_info** - 获取贡献者信息
7. **get_repo_activity_trend** - 获取活跃度趋势
8. **get_github_repo_info** - 获取 GitHub 仓库基本信息
9. **get_github_contributors** - 获取贡献者列表
10. **find_good_first_issues** - 查找适合新手的 Issue
11. **search_opensource_knowledge** - 搜索开源运营知识库
12. **compare_repos** - 对比多个仓库的核心指标

## 工作流程
1. 理解用户需求
2. 选择合适的工具获取信息
3. 分析工具返回的数据
4. 给出专业、有价值的回答

## 回答要求
- 使用中文回答
- 回答要专业但友好
- 提供具体的数据支撑
- 给出可执行的建议

当用户提到仓库时，优先使用 analyze_repo_health 获取全面分析，然后根据需要使用其他工具补充信息。
";

const DISPLAY_NAMES: [(&str, &str); 12] = [
    ("analyze_repo_health", "📊 分析仓库健康度"),
    ("diagnose_repo_issues", "🔍 诊断问题"),
    ("get_improvement_suggestions", "💡 获取建议"),
    ("get_repo_openrank", "📈 获取 OpenRank"),
    ("get_repo_health_metrics", "📊 获取健康指标"),
    ("get_repo_contributors_info", "👥 获取贡献者信息"),
    ("get_repo_activity_trend", "📉 获取活跃度趋势"),
    ("get_github_repo_info", "🔗 获取 GitHub 信息"),
    ("get_github_contributors", "👥 获取贡献者列表"),
    ("find_good_first_issues", "🎯 查找新手 Issue"),
    ("search_opensource_knowledge", "📚 搜索知识库"),
    ("compare_repos", "⚖️ 对比仓库"),
];

/// Label shown to users for a tool; unknown names pass through unchanged.
pub fn display_name(tool: &str) -> &str {
    DISPLAY_NAMES
        .iter()
        .find(|(name, _)| *name == tool)
        .map(|(_, label)| *label)
        .unwrap_or(tool)
}
