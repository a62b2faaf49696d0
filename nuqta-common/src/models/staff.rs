use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
#[sqlx(rename_all = "lowercase")]
pub enum StaffRole {
    Admin,
    Manager,
    Cashier,
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaffRole::Admin => write!(f, "admin"),
            StaffRole::Manager => write!(f, "manager"),
            StaffRole::Cashier => write!(f, "cashier"),
        }
    }
}

impl FromStr for StaffRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(StaffRole::Admin),
            "manager" => Ok(StaffRole::Manager),
            "cashier" => Ok(StaffRole::Cashier),
            _ => Err(format!("Unknown staff role: {}", s)),
        }
    }
}

/// Closed set of staff capabilities.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ScanQr,
    AddPoints,
    ApproveRedemptions,
    MarkRedemptionsUsed,
    ManageRewards,
    ManageCustomers,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ScanQr => "scan_qr",
            Permission::AddPoints => "add_points",
            Permission::ApproveRedemptions => "approve_redemptions",
            Permission::MarkRedemptionsUsed => "mark_redemptions_used",
            Permission::ManageRewards => "manage_rewards",
            Permission::ManageCustomers => "manage_customers",
        }
    }
}

impl FromStr for Permission {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scan_qr" => Ok(Permission::ScanQr),
            "add_points" => Ok(Permission::AddPoints),
            "approve_redemptions" => Ok(Permission::ApproveRedemptions),
            "mark_redemptions_used" => Ok(Permission::MarkRedemptionsUsed),
            "manage_rewards" => Ok(Permission::ManageRewards),
            "manage_customers" => Ok(Permission::ManageCustomers),
            _ => Err(format!("Unknown permission: {}", s)),
        }
    }
}

/// Capability set for a staff member. Stored as a JSON array of permission
/// names in the staff row.
#[derive(Debug, Serialize, Deserialize, Clone, Default, Eq, PartialEq)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn grant(&mut self, perm: Permission) {
        self.0.insert(perm);
    }

    pub fn revoke(&mut self, perm: Permission) {
        self.0.remove(&perm);
    }

    pub fn contains(&self, perm: Permission) -> bool {
        self.0.contains(&perm)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A tenant's staff member.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Staff {
    pub staff_id: Uuid,
    pub tenant_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: StaffRole,
    pub permissions: PermissionSet,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Staff {
    /// Admin override is evaluated first; everyone else consults the
    /// capability set.
    pub fn has_permission(&self, perm: Permission) -> bool {
        if self.role == StaffRole::Admin {
            return true;
        }
        self.permissions.contains(perm)
    }

    pub fn can_scan_qr(&self) -> bool {
        self.has_permission(Permission::ScanQr)
    }

    pub fn can_approve_redemptions(&self) -> bool {
        self.has_permission(Permission::ApproveRedemptions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff(role: StaffRole, perms: &[Permission]) -> Staff {
        Staff {
            staff_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            full_name: "Test Staff".into(),
            email: "staff@example.com".into(),
            role,
            permissions: perms.iter().copied().collect(),
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn admin_overrides_sparse_set() {
        let s = staff(StaffRole::Admin, &[]);
        assert!(s.has_permission(Permission::ManageRewards));
        assert!(s.can_scan_qr());
    }

    #[test]
    fn non_admin_checks_capability_set() {
        let s = staff(StaffRole::Cashier, &[Permission::ScanQr]);
        assert!(s.can_scan_qr());
        assert!(!s.can_approve_redemptions());
    }

    #[test]
    fn permission_names_round_trip() {
        for p in [
            Permission::ScanQr,
            Permission::AddPoints,
            Permission::ApproveRedemptions,
            Permission::MarkRedemptionsUsed,
            Permission::ManageRewards,
            Permission::ManageCustomers,
        ] {
            assert_eq!(p.as_str().parse::<Permission>().unwrap(), p);
        }
    }
}
