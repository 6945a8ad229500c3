use std::sync::Arc;

use trellis::{EntityDef, Metamodel, Registry, ScalarType};

/// Member/Team model: members carry a nullable `team_id` foreign key.
pub fn metamodel() -> Arc<dyn Metamodel> {
    Arc::new(
        Registry::new()
            .register(
                EntityDef::new("Member", "member")
                    .field("id", ScalarType::Int)
                    .field("username", ScalarType::Text)
                    .field("age", ScalarType::Int)
                    .field("team_id", ScalarType::Int)
                    .many_to_one("team", "Team", "team_id"),
            )
            .register(
                EntityDef::new("Team", "team")
                    .field("id", ScalarType::Int)
                    .field("name", ScalarType::Text)
                    .one_to_many("members", "Member", "team_id"),
            ),
    )
}
