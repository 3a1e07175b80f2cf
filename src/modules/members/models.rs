use bson::{oid::ObjectId, DateTime, Document};
use orioz_kernel::settings::AdminSeedSettings;
use serde::{Deserialize, Serialize};

/// Role tags a member can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Member,
    Admin,
    Finance,
    Prime,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "MEMBER",
            Self::Admin => "ADMIN",
            Self::Finance => "FINANCE",
            Self::Prime => "PRIME",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pending,
    Confirmed,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInfo {
    /// e.g. `LOCAL`, `OVERSEAS`, `MAILING`
    #[serde(rename = "type")]
    pub kind: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub post_code: String,
    pub province: String,
    pub country: String,
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    /// e.g. `EMAIL`, `LOCAL_PHONE`, `WHATSAPP`
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    pub method: String,
    pub primary: bool,
}

/// Payment record for lifetime members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipDetails {
    pub payment_transaction_id: String,
    pub payment_date: DateTime,
    pub amount_paid: f64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredEvent {
    pub event_id: String,
    pub registration_date: DateTime,
}

/// Document stored in the `members` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Bcrypt hash, never plain text.
    pub password: String,
    pub date_of_birth: DateTime,
    pub addresses: Vec<AddressInfo>,
    pub contacts: Vec<ContactInfo>,
    pub occupation: String,
    pub profile_picture_url: String,
    pub is_lifetime_member: bool,
    pub membership_details: Option<MembershipDetails>,
    pub member_since: DateTime,
    pub last_login: Option<DateTime>,
    pub roles: Vec<Role>,
    pub registered_events: Vec<RegisteredEvent>,
    pub preferences: Document,
    pub status: Status,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Member {
    /// The confirmed administrator seeded into an empty-of-admins database.
    pub fn administrator(seed: &AdminSeedSettings, now: DateTime) -> anyhow::Result<Self> {
        let date_of_birth = seed
            .date_of_birth
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow::anyhow!("invalid date of birth {}", seed.date_of_birth))?
            .and_utc();

        Ok(Self {
            id: None,
            first_name: seed.first_name.clone(),
            last_name: seed.last_name.clone(),
            email: seed.email.clone(),
            password: seed.password_hash.clone(),
            date_of_birth: DateTime::from_chrono(date_of_birth),
            addresses: vec![AddressInfo {
                kind: "LOCAL".to_string(),
                street: "123 Orioz Lane".to_string(),
                city: "Brisbane".to_string(),
                state: "QLD".to_string(),
                zip_code: "4000".to_string(),
                post_code: "4000".to_string(),
                province: String::new(),
                country: "Australia".to_string(),
                primary: true,
            }],
            contacts: vec![ContactInfo {
                kind: "EMAIL".to_string(),
                value: seed.email.clone(),
                method: "EMAIL".to_string(),
                primary: true,
            }],
            occupation: "System Administrator".to_string(),
            profile_picture_url: "https://example.com/images/admin.png".to_string(),
            is_lifetime_member: false,
            membership_details: None,
            member_since: now,
            last_login: None,
            roles: vec![Role::Admin, Role::Member],
            registered_events: Vec::new(),
            preferences: Document::new(),
            status: Status::Confirmed,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn to_document(&self) -> Result<Document, bson::ser::Error> {
        bson::to_document(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::Bson;

    fn admin() -> Member {
        Member::administrator(
            &AdminSeedSettings::default(),
            DateTime::from_millis(1_700_000_000_000),
        )
        .unwrap()
    }

    #[test]
    fn administrator_holds_admin_and_member_roles() {
        let member = admin();
        assert!(member.has_role(Role::Admin));
        assert!(member.has_role(Role::Member));
        assert!(!member.has_role(Role::Finance));
        assert_eq!(member.status, Status::Confirmed);
        assert_eq!(member.contacts[0].value, "admin@orioz.org");
    }

    #[test]
    fn document_uses_stored_field_names() {
        let document = admin().to_document().unwrap();

        assert!(document.get("_id").is_none());
        assert_eq!(document.get_str("firstName").unwrap(), "Super");
        assert_eq!(document.get_str("email").unwrap(), "admin@orioz.org");
        assert!(!document.get_bool("isLifetimeMember").unwrap());
        assert_eq!(document.get("membershipDetails"), Some(&Bson::Null));
        assert_eq!(document.get("lastLogin"), Some(&Bson::Null));
        assert_eq!(document.get_str("status").unwrap(), "CONFIRMED");
        assert!(document.get_document("preferences").unwrap().is_empty());
        assert!(document.get_array("registeredEvents").unwrap().is_empty());

        let roles = document.get_array("roles").unwrap();
        assert_eq!(
            roles,
            &vec![Bson::String("ADMIN".into()), Bson::String("MEMBER".into())]
        );

        let address = document.get_array("addresses").unwrap()[0]
            .as_document()
            .unwrap();
        assert_eq!(address.get_str("type").unwrap(), "LOCAL");
        assert_eq!(address.get_str("zipCode").unwrap(), "4000");
        assert_eq!(address.get_str("province").unwrap(), "");
    }

    #[test]
    fn date_of_birth_is_midnight_utc() {
        let member = admin();
        // 1980-01-01T00:00:00Z
        assert_eq!(member.date_of_birth.timestamp_millis(), 315_532_800_000);
    }

    #[test]
    fn timestamps_share_the_run_instant() {
        let member = admin();
        assert_eq!(member.member_since, member.created_at);
        assert_eq!(member.created_at, member.updated_at);
        assert!(member.last_login.is_none());
    }

    #[test]
    fn stored_document_reads_back() {
        let member = admin();
        let parsed: Member = bson::from_document(member.to_document().unwrap()).unwrap();
        assert_eq!(parsed, member);
    }
}
