//! Four-dimension health score (0-100 each).

use super::{RepoSnapshot, display_optional, display_number};
use serde::Serialize;

const ACTIVITY_WEIGHT: f64 = 0.3;
const COMMUNITY_WEIGHT: f64 = 0.25;
const MAINTENANCE_WEIGHT: f64 = 0.25;
const GROWTH_WEIGHT: f64 = 0.2;

/// One week, in hours. A response slower than this scores zero.
const RESPONSE_CEILING_HOURS: f64 = 168.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthScore {
    pub overall: f64,
    pub activity: f64,
    pub community: f64,
    pub maintenance: f64,
    pub growth: f64,
    pub summary: &'static str,
    pub highlights: Vec<String>,
    pub concerns: Vec<String>,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn activity_score(s: &RepoSnapshot) -> f64 {
    let openrank = s.openrank.unwrap_or(0.0).min(100.0);
    let activity = (s.activity.unwrap_or(0.0) * 5.0).min(100.0);
    openrank * 0.6 + activity * 0.4
}

pub fn community_score(s: &RepoSnapshot) -> f64 {
    let participants = (s.participants / 5.0).min(100.0);
    let bus_factor = (s.bus_factor * 10.0).min(100.0);
    participants * 0.5 + bus_factor * 0.5
}

pub fn maintenance_score(s: &RepoSnapshot) -> f64 {
    let response = match s.avg_response_time {
        Some(t) if t > 0.0 => (100.0 - t / RESPONSE_CEILING_HOURS * 100.0).max(0.0),
        _ => 50.0,
    };
    s.merge_rate * 100.0 * 0.5 + response * 0.5
}

pub fn growth_score(s: &RepoSnapshot) -> f64 {
    let newcomers = (s.new_contributors * 10.0).min(100.0);
    let stars = if s.stars > 0.0 {
        (s.stars / 100.0).min(100.0)
    } else {
        50.0
    };
    newcomers * 0.6 + stars * 0.4
}

pub fn score(s: &RepoSnapshot) -> HealthScore {
    let activity = activity_score(s);
    let community = community_score(s);
    let maintenance = maintenance_score(s);
    let growth = growth_score(s);
    let overall = activity * ACTIVITY_WEIGHT
        + community * COMMUNITY_WEIGHT
        + maintenance * MAINTENANCE_WEIGHT
        + growth * GROWTH_WEIGHT;

    let summary = match overall {
        o if o >= 80.0 => "项目整体健康状况优秀，社区运营良好",
        o if o >= 60.0 => "项目健康状况良好，有一些可以改进的地方",
        o if o >= 40.0 => "项目健康状况一般，建议重点关注薄弱环节",
        _ => "项目健康状况需要关注，建议采取改进措施",
    };

    let mut highlights = Vec::new();
    if activity >= 70.0 {
        highlights.push(format!(
            "项目活跃度高，OpenRank 值为 {}",
            display_optional(s.openrank)
        ));
    }
    if community >= 70.0 {
        highlights.push(format!(
            "社区健康，有 {} 位参与者",
            display_number(s.participants)
        ));
    }
    if maintenance >= 70.0 {
        highlights.push("维护响应迅速，Issue/PR 处理及时".to_string());
    }
    if growth >= 70.0 {
        highlights.push("项目保持良好增长态势".to_string());
    }
    if highlights.is_empty() {
        highlights.push("项目正在稳定发展中".to_string());
    }

    let mut concerns = Vec::new();
    if activity < 50.0 {
        concerns.push("活跃度较低，建议增加社区活动".to_string());
    }
    if community < 50.0 {
        concerns.push("贡献者生态需要加强，建议吸引更多参与者".to_string());
    }
    if maintenance < 50.0 {
        concerns.push("维护响应可以更快，建议优化 Issue/PR 处理流程".to_string());
    }
    if growth < 50.0 {
        concerns.push("增长趋势放缓，建议加强推广和社区运营".to_string());
    }
    if s.bus_factor > 0.0 && s.bus_factor < 3.0 {
        concerns.push(format!(
            "巴士因子仅为 {}，项目过于依赖少数贡献者",
            display_number(s.bus_factor)
        ));
    }

    HealthScore {
        overall: round1(overall),
        activity: round1(activity),
        community: round1(community),
        maintenance: round1(maintenance),
        growth: round1(growth),
        summary,
        highlights,
        concerns,
    }
}
