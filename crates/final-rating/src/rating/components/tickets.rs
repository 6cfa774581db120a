use super::capped_component;
use crate::rating::breakdown::CappedBreakdown;
use crate::rating::config::TicketsConfig;

pub fn calculate_tickets(tickets_resolved: u32, config: &TicketsConfig) -> CappedBreakdown {
    if !config.enabled {
        return CappedBreakdown::disabled();
    }

    capped_component(
        "tickets_resolved",
        "tickets",
        tickets_resolved,
        "points_per_ticket",
        config.points_per_ticket,
        config.max_points,
    )
}
