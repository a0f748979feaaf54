use anyhow::Result;
use itertools::Itertools;
use log::info;

use crate::{cli::FieldsArgs, table, vocabulary::Vocabulary};

pub fn execute(args: &FieldsArgs) -> Result<()> {
    let vocabulary = Vocabulary::load_or_builtin(args.vocabulary.as_deref())?;
    let headers = ["#", "field", "required", "date", "visible", "aliases"]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    let rows = field_rows(&vocabulary);
    table::print_table(&headers, &rows);
    info!(
        "Listed {} canonical field(s), {} required",
        vocabulary.fields().len(),
        vocabulary.required().len()
    );
    Ok(())
}

fn field_rows(vocabulary: &Vocabulary) -> Vec<Vec<String>> {
    let flag = |set: bool| (if set { "yes" } else { "" }).to_string();
    vocabulary
        .fields()
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            vec![
                (idx + 1).to_string(),
                field.clone(),
                flag(vocabulary.is_required(field)),
                flag(vocabulary.is_date_field(field)),
                flag(vocabulary.visible_default().contains(field)),
                vocabulary.aliases_for(field).iter().join(", "),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::TRABAJADOR;

    #[test]
    fn field_rows_flag_required_and_list_aliases() {
        let rows = field_rows(&Vocabulary::builtin());
        let identity = rows
            .iter()
            .find(|row| row[1] == TRABAJADOR)
            .expect("identity row");
        assert_eq!(identity[2], "yes");
        assert_eq!(identity[3], "");
        assert_eq!(identity[5], "DNI, TRABAJADOR");
    }
}
