//! Shared fixtures: a two-entity Member/Team schema with typed column
//! descriptors, plus a canonical seed of two teams and four members.

use crate::{
    expr::Column,
    model::{AssociationModel, EntityFieldModel, EntityModel, EntityRef},
    store::MemoryStore,
    value::{Value, ValueKind},
};

pub(crate) static MEMBER: EntityModel = EntityModel {
    name: "Member",
    primary_key: "id",
    fields: &[
        EntityFieldModel {
            name: "id",
            kind: ValueKind::Int,
        },
        EntityFieldModel {
            name: "username",
            kind: ValueKind::Text,
        },
        EntityFieldModel {
            name: "age",
            kind: ValueKind::Int,
        },
        EntityFieldModel {
            name: "team_id",
            kind: ValueKind::Int,
        },
    ],
    associations: &[AssociationModel {
        name: "team",
        target: "Team",
        local_field: "team_id",
        foreign_field: "id",
    }],
};

pub(crate) static TEAM: EntityModel = EntityModel {
    name: "Team",
    primary_key: "id",
    fields: &[
        EntityFieldModel {
            name: "id",
            kind: ValueKind::Int,
        },
        EntityFieldModel {
            name: "name",
            kind: ValueKind::Text,
        },
    ],
    associations: &[AssociationModel {
        name: "members",
        target: "Member",
        local_field: "id",
        foreign_field: "team_id",
    }],
};

///
/// MemberCols
///
/// Hand-written typed descriptor, one method per field. Generated code
/// would produce the same shape.
///

#[derive(Clone, Copy)]
pub(crate) struct MemberCols {
    pub entity: EntityRef,
}

impl MemberCols {
    pub const fn new() -> Self {
        Self {
            entity: EntityRef::new(&MEMBER),
        }
    }

    pub const fn aliased(alias: &'static str) -> Self {
        Self {
            entity: EntityRef::aliased(&MEMBER, alias),
        }
    }

    pub const fn id(&self) -> Column {
        Column::new(self.entity.alias, "id", ValueKind::Int)
    }

    pub const fn username(&self) -> Column {
        Column::new(self.entity.alias, "username", ValueKind::Text)
    }

    pub const fn age(&self) -> Column {
        Column::new(self.entity.alias, "age", ValueKind::Int)
    }

    pub const fn team_id(&self) -> Column {
        Column::new(self.entity.alias, "team_id", ValueKind::Int)
    }
}

///
/// TeamCols
///

#[derive(Clone, Copy)]
pub(crate) struct TeamCols {
    pub entity: EntityRef,
}

impl TeamCols {
    pub const fn new() -> Self {
        Self {
            entity: EntityRef::new(&TEAM),
        }
    }

    pub const fn aliased(alias: &'static str) -> Self {
        Self {
            entity: EntityRef::aliased(&TEAM, alias),
        }
    }

    pub const fn id(&self) -> Column {
        Column::new(self.entity.alias, "id", ValueKind::Int)
    }

    pub const fn name(&self) -> Column {
        Column::new(self.entity.alias, "name", ValueKind::Text)
    }
}

/// Seed teamA/teamB and member1-4 (ages 10/20/30/40, first two in
/// teamA, last two in teamB). Returns the team ids.
pub(crate) fn seed_defaults(store: &MemoryStore) -> (i64, i64) {
    let team_a = store
        .insert(&TEAM, vec![("name", Value::from("teamA"))])
        .unwrap();
    let team_b = store
        .insert(&TEAM, vec![("name", Value::from("teamB"))])
        .unwrap();

    #[expect(clippy::cast_possible_wrap)]
    let (team_a, team_b) = (team_a as i64, team_b as i64);

    for (username, age, team) in [
        ("member1", 10, team_a),
        ("member2", 20, team_a),
        ("member3", 30, team_b),
        ("member4", 40, team_b),
    ] {
        store
            .insert(
                &MEMBER,
                vec![
                    ("username", Value::from(username)),
                    ("age", Value::from(age)),
                    ("team_id", Value::Int(team)),
                ],
            )
            .unwrap();
    }

    (team_a, team_b)
}
