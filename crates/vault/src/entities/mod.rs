//! Core entities for the vault.

mod activity;
mod skill;
mod task;
mod widgets;

pub use activity::{ActivityItem, AuditEntry, ChatRecord, ChatRole};
pub use skill::{Skill, SkillCategory, SkillStatus};
pub use task::{Decision, Importance, NewTask, Priority, Task, TaskStatus, VaultFolder};
pub use widgets::{AgentStatus, DashboardSummary, FinancialSnapshot, SocialStat};
