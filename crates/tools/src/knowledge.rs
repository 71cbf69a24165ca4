//! Built-in knowledge base of open-source community operations practice.
//!
//! Matching is keyword based: a topic is returned when any of its
//! keywords occurs in the lowercased query. Matches are joined with a
//! horizontal rule, in topic order.

use async_trait::async_trait;
use oscopilot_core::error::ToolError;
use oscopilot_core::tool::Tool;

pub const SEPARATOR: &str = "\n\n---\n\n";

struct Topic {
    keywords: &'static [&'static str],
    content: &'static str,
}

const TOPICS: [Topic; 6] = [
    Topic {
        keywords: &["健康", "健康度", "社区健康", "health"],
        content: "开源社区健康度评估要点：
1. 活跃度指标：定期的代码提交、Issue 讨论、PR 合并
2. 多样性：贡献者来自不同组织、地区
3. 响应速度：Issue 和 PR 的响应时间
4. 文档完善度：README、贡献指南、API 文档
5. 治理透明度：决策过程公开、规则明确",
    },
    Topic {
        keywords: &["贡献者", "contributor", "增长", "提升", "吸引"],
        content: "如何提升开源项目贡献者数量：
1. 标记 \"good first issue\" 吸引新手
2. 编写详细的贡献指南 (CONTRIBUTING.md)
3. 及时回复和合并 PR，给予正向反馈
4. 建立社区沟通渠道（Discord、Slack、微信群）
5. 定期举办贡献者活动和 Hackathon
6. 公开感谢贡献者（Contributors 列表、Release Notes）",
    },
    Topic {
        keywords: &["issue", "问题管理", "issues"],
        content: "Issue 管理最佳实践：
1. 使用 Issue 模板规范问题报告
2. 及时分类和打标签
3. 设置 SLA 目标（如 48 小时内首次回复）
4. 定期清理过期 Issue
5. 将常见问题整理到 FAQ 或文档",
    },
    Topic {
        keywords: &["pr", "pull request", "代码审查", "review", "合并"],
        content: "PR Review 最佳实践：
1. 建立代码审查规范
2. 使用自动化 CI/CD 检查
3. 避免 PR 积压，设置合并时间目标
4. 给予建设性反馈
5. 对于大型 PR，建议拆分",
    },
    Topic {
        keywords: &["openrank", "影响力", "评分"],
        content: "OpenRank 指标解读：
OpenRank 是 X-lab 提出的开源项目影响力评估算法，基于协作网络的 PageRank 变体。

核心特点：
1. 考虑贡献者的质量和多样性
2. 时间衰减因子，近期活动权重更高
3. 综合考虑 Issue、PR、Review、Commit 等多种贡献
4. 全球开源项目可比较

OpenRank 值参考：
- > 100: 顶级开源项目（如 Linux、Kubernetes）
- 50-100: 知名开源项目
- 20-50: 活跃的中型项目
- 5-20: 有一定影响力的项目
- < 5: 小型或新兴项目",
    },
    Topic {
        keywords: &["巴士因子", "bus factor", "核心贡献者", "风险"],
        content: "巴士因子 (Bus Factor) 解读：
巴士因子表示项目中有多少核心贡献者，如果这些人\"被巴士撞了\"项目就会陷入困境。

健康标准：
- 巴士因子 ≥ 3: 健康，风险较低
- 巴士因子 = 2: 需要关注，应培养更多核心贡献者
- 巴士因子 = 1: 高风险，严重依赖单一贡献者

提升建议：
1. 积极培养新的核心贡献者
2. 完善文档，降低知识门槛
3. 代码审查时让更多人参与
4. 分散维护职责",
    },
];

const GENERAL_ADVICE: &str = "没有找到精确匹配的知识，以下是一些通用的开源运营建议：

1. 保持项目活跃：定期发布、及时响应社区反馈
2. 完善文档：让新人更容易上手
3. 建立社区：创建沟通渠道，培养贡献者
4. 透明治理：公开决策过程，建立信任
5. 持续改进：关注指标变化，及时调整策略";

/// Every matching topic, or general advice when nothing matches.
pub fn search(query: &str) -> String {
    let query = query.to_lowercase();
    let matches: Vec<&str> = TOPICS
        .iter()
        .filter(|t| t.keywords.iter().any(|kw| query.contains(kw)))
        .map(|t| t.content)
        .collect();

    if matches.is_empty() {
        GENERAL_ADVICE.to_string()
    } else {
        matches.join(SEPARATOR)
    }
}

pub struct KnowledgeSearchTool;

#[async_trait]
impl Tool for KnowledgeSearchTool {
    fn name(&self) -> &str {
        "search_opensource_knowledge"
    }

    fn description(&self) -> &str {
        "在开源运营知识库中搜索相关最佳实践和建议。"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "搜索关键词，如 \"如何提升贡献者数量\"、\"OpenRank 是什么\""
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;
        Ok(search(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_topic_match() {
        let out = search("OpenRank 是什么");
        assert!(out.starts_with("OpenRank 指标解读："));
        assert!(!out.contains(SEPARATOR));
    }

    #[test]
    fn multiple_topics_in_order() {
        let out = search("如何提升贡献者数量，降低巴士因子风险");
        let parts: Vec<&str> = out.split(SEPARATOR).collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].starts_with("如何提升开源项目贡献者数量"));
        assert!(parts[1].starts_with("巴士因子 (Bus Factor) 解读"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert!(search("Bus Factor").starts_with("巴士因子"));
        assert!(search("HEALTH check").starts_with("开源社区健康度评估要点"));
    }

    #[test]
    fn no_match_gives_general_advice() {
        assert_eq!(search("天气怎么样"), GENERAL_ADVICE);
    }

    #[tokio::test]
    async fn missing_query_returns_error() {
        let result = KnowledgeSearchTool.execute(json!({})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[test]
    fn tool_definition() {
        let def = KnowledgeSearchTool.to_definition();
        assert_eq!(def.name, "search_opensource_knowledge");
        assert_eq!(def.parameters["required"][0], "query");
    }
}
