use super::*;
use crate::{
    exec::QueryFactory,
    store::MemoryStore,
    test_support::{MemberCols, seed_defaults},
};

const M: MemberCols = MemberCols::new();

fn seeded() -> MemoryStore {
    let store = MemoryStore::new();
    seed_defaults(&store);
    store
}

#[derive(Debug, Default, PartialEq)]
struct MemberDto {
    username: String,
    age: i64,
}

impl FieldBind for MemberDto {
    fn bind_field(&mut self, field: &str, value: &Value) -> bool {
        match field {
            "username" => {
                if let Some(text) = value.as_text() {
                    self.username = text.to_string();
                }
                true
            }
            "age" => {
                if let Some(age) = value.as_i64() {
                    self.age = age;
                }
                true
            }
            _ => false,
        }
    }
}

/// Setter-style target whose field is named differently from the
/// column, so it only fills through an alias.
#[derive(Debug, Default, PartialEq)]
struct UserDto {
    name: String,
}

impl SetterBind for UserDto {
    fn apply_setter(&mut self, field: &str, value: &Value) -> bool {
        if field == "name" {
            if let Some(text) = value.as_text() {
                self.name = text.to_string();
            }
            return true;
        }
        false
    }
}

#[derive(Debug, Default, PartialEq)]
struct MemberPair {
    username: String,
    age: i64,
}

impl ConstructorBind for MemberPair {
    fn from_values(values: &[Value]) -> Result<Self, Error> {
        expect_arity(values, 2)?;
        Ok(Self {
            username: values[0].as_text().unwrap_or_default().to_string(),
            age: values[1].as_i64().unwrap_or_default(),
        })
    }
}

#[test]
fn field_binding_matches_column_names() {
    let store = seeded();
    let rows = QueryFactory::new(&store)
        .select(vec![M.username().expr(), M.age().expr()])
        .from(M.entity)
        .filter(M.username().eq("member1").unwrap())
        .fetch_list()
        .unwrap();

    let dto: MemberDto = fields(&rows[0]);
    assert_eq!(
        dto,
        MemberDto {
            username: "member1".to_string(),
            age: 10,
        }
    );
}

#[test]
fn unnamed_expressions_are_skipped_by_name_binding() {
    let store = seeded();
    let rows = QueryFactory::new(&store)
        .select(vec![
            M.username().expr(),
            // No alias: the doubled age has no binding name.
            M.age().multiply(2).unwrap(),
        ])
        .from(M.entity)
        .filter(M.username().eq("member1").unwrap())
        .fetch_list()
        .unwrap();

    let dto: MemberDto = fields(&rows[0]);
    assert_eq!(dto.username, "member1");
    assert_eq!(dto.age, 0);
}

#[test]
fn alias_renames_a_selection_for_setter_binding() {
    let store = seeded();
    let rows = QueryFactory::new(&store)
        .select(vec![M.username().alias("name")])
        .from(M.entity)
        .filter(M.username().eq("member2").unwrap())
        .fetch_list()
        .unwrap();

    let dto: UserDto = setters(&rows[0]);
    assert_eq!(dto.name, "member2");

    // Without the alias the setter never fires.
    let rows = QueryFactory::new(&store)
        .select(vec![M.username().expr()])
        .from(M.entity)
        .filter(M.username().eq("member2").unwrap())
        .fetch_list()
        .unwrap();
    let dto: UserDto = setters(&rows[0]);
    assert_eq!(dto, UserDto::default());
}

#[test]
fn constructor_binding_is_positional_and_ignores_aliases() {
    let store = seeded();
    let rows = QueryFactory::new(&store)
        .select(vec![
            M.username().alias("whatever"),
            M.age().alias("ignored"),
        ])
        .from(M.entity)
        .filter(M.username().eq("member3").unwrap())
        .fetch_list()
        .unwrap();

    let pair: MemberPair = constructor(&rows[0]).unwrap();
    assert_eq!(
        pair,
        MemberPair {
            username: "member3".to_string(),
            age: 30,
        }
    );
}

#[test]
fn constructor_arity_mismatch_surfaces_at_mapping_time() {
    let store = seeded();
    let rows = QueryFactory::new(&store)
        .select(vec![M.username().expr()])
        .from(M.entity)
        .fetch_list()
        .unwrap();

    let err = constructor::<MemberPair>(&rows[0]).unwrap_err();
    assert_eq!(
        err,
        Error::ProjectionArityMismatch {
            expected: 2,
            found: 1,
        }
    );
}

#[test]
fn constructor_with_swapped_order_binds_silently_wrong() {
    let store = seeded();
    // age first, username second: arity matches, fields do not.
    let rows = QueryFactory::new(&store)
        .select(vec![M.age().expr(), M.username().expr()])
        .from(M.entity)
        .filter(M.username().eq("member4").unwrap())
        .fetch_list()
        .unwrap();

    let pair: MemberPair = constructor(&rows[0]).unwrap();
    assert_eq!(pair, MemberPair::default());
}

#[test]
fn list_helpers_project_every_row() {
    let store = seeded();
    let rows = QueryFactory::new(&store)
        .select(vec![M.username().expr(), M.age().expr()])
        .from(M.entity)
        .fetch_list()
        .unwrap();

    let dtos: Vec<MemberDto> = fields_list(&rows);
    assert_eq!(dtos.len(), 4);
    assert_eq!(dtos[3].username, "member4");

    let pairs: Vec<MemberPair> = constructor_list(&rows).unwrap();
    assert_eq!(pairs[0].age, 10);
}
