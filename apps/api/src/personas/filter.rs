//! Query-string filter for `GET /personas`.
//!
//! Every query parameter is an equality match on a stored persona field.
//! A key naming no persona field, or a value no stored field can hold,
//! matches nothing.

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::persona::Persona;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonaFilter {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub age: Option<f64>,
    pub gender: Option<String>,
    pub occupation: Option<String>,
    pub bio: Option<String>,
    /// Set when some condition can never hold.
    pub unsatisfiable: bool,
}

impl PersonaFilter {
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        let mut filter = PersonaFilter::default();

        for (key, value) in params {
            match key.as_str() {
                "id" | "_id" => match value.parse::<Uuid>() {
                    Ok(id) => filter.id = Some(id),
                    Err(_) => filter.unsatisfiable = true,
                },
                "name" => filter.name = Some(value.clone()),
                "age" => match value.trim().parse::<f64>().ok().filter(|a| a.is_finite()) {
                    Some(age) => filter.age = Some(age),
                    None => filter.unsatisfiable = true,
                },
                "gender" => filter.gender = Some(value.clone()),
                "occupation" => filter.occupation = Some(value.clone()),
                "bio" => filter.bio = Some(value.clone()),
                _ => filter.unsatisfiable = true,
            }
        }

        filter
    }

    pub fn matches(&self, persona: &Persona) -> bool {
        fn eq<T: PartialEq>(want: &Option<T>, have: Option<&T>) -> bool {
            want.as_ref().map_or(true, |w| have == Some(w))
        }

        !self.unsatisfiable
            && eq(&self.id, Some(&persona.id))
            && eq(&self.name, Some(&persona.name))
            && eq(&self.age, persona.age.as_ref())
            && eq(&self.gender, persona.gender.as_ref())
            && eq(&self.occupation, persona.occupation.as_ref())
            && eq(&self.bio, persona.bio.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::persona::NewPersona;
    use chrono::Utc;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn sample() -> Persona {
        NewPersona {
            name: "Ada".into(),
            age: Some(36.0),
            gender: None,
            occupation: Some("engineer".into()),
            bio: None,
        }
        .into_persona(Utc::now())
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let filter = PersonaFilter::from_query(&HashMap::new());
        assert_eq!(filter, PersonaFilter::default());
        assert!(filter.matches(&sample()));
    }

    #[test]
    fn test_field_filters() {
        let p = sample();
        let hit = PersonaFilter::from_query(&query(&[("occupation", "engineer"), ("age", "36")]));
        assert!(hit.matches(&p));

        let miss = PersonaFilter::from_query(&query(&[("gender", "male")]));
        assert!(!miss.matches(&p));

        let by_id = PersonaFilter::from_query(&query(&[("_id", &p.id.to_string())]));
        assert!(by_id.matches(&p));
    }

    #[test]
    fn test_unmatchable_conditions_match_nothing() {
        let p = sample();
        for pairs in [
            [("age", "old")],
            [("age", "")],
            [("id", "123")],
            [("shoeSize", "9")],
        ] {
            let filter = PersonaFilter::from_query(&query(&pairs));
            assert!(filter.unsatisfiable, "{pairs:?}");
            assert!(!filter.matches(&p), "{pairs:?}");
        }

        let mixed = PersonaFilter::from_query(&query(&[("name", "Ada"), ("height", "180")]));
        assert!(!mixed.matches(&p));
    }
}
