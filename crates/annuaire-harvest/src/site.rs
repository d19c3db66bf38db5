//! Page layout of the annuaire.sante.fr directory.
//!
//! Every selector the harvester uses lives here so a layout change on the
//! site is a one-file fix.

use annuaire_browser::Selector;
use annuaire_core::Field;

/// Marker text shown when a profile has no published details.
pub const NO_INFORMATION_TEXT: &str = "Pas d'information renseignée dans cette rubrique";

/// Selectors for the search form, result listing and profile pages.
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    /// Search button; clicked once to focus the form and again to submit
    pub search_submit: Selector,
    /// Keyword input
    pub keyword_input: Selector,
    /// Location input
    pub location_input: Selector,
    /// Profile links on a result page
    pub result_links: Selector,
    /// "Next page" link
    pub next_page: Selector,
    /// Loading spinner shown while results or profiles load
    pub loading: Selector,
    /// "No information" marker on an empty profile
    pub no_information: Selector,
    /// Second address line holding postal code and city
    pub finess_address: Selector,
    /// Company number as displayed on the profile
    pub company_id: Selector,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            search_submit: Selector::css(".champ_submit"),
            keyword_input: Selector::css("input[id='_rechercheportlet_INSTANCE_ctPdpHA24ctE_texttofind']"),
            location_input: Selector::css("input[id='_rechercheportlet_INSTANCE_ctPdpHA24ctE_adresse']"),
            result_links: Selector::css("div[class='nom_prenom'] > a"),
            next_page: Selector::css("a[title='Suivant']"),
            loading: Selector::xpath("//img[contains(@src, 'loading')]"),
            no_information: Selector::xpath(format!(
                "//div[@class='blocs_details_infos_identif']/span[text()=\"{NO_INFORMATION_TEXT}\"]"
            )),
            finess_address: Selector::xpath(
                "//span[contains(@class, 'label FINESS')]/following-sibling::span[1]",
            ),
            company_id: Selector::labelled("SIREN"),
        }
    }
}

/// Where a page-sourced field is read from. `None` for fields that are
/// derived, enriched or stamped rather than read.
#[must_use]
pub fn field_selector(field: Field) -> Option<Selector> {
    let selector = match field {
        Field::Name => Selector::css("div[class='details_entete_synthese'] > div[class='nom_prenom']"),
        Field::RppsNumber => Selector::css("div[class='rpps'] > span"),
        Field::Specialty => Selector::css("div[class='ico_etat_main'] ~ div"),
        Field::FinessId => Selector::labelled("Identifiant FINESS"),
        Field::Phone => Selector::labelled("Téléphone"),
        Field::Fax => Selector::labelled("Fax"),
        Field::AddressRaw => Selector::labelled("Adresse :"),
        Field::Region => Selector::labelled("Région"),
        _ => return None,
    };
    Some(selector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use annuaire_core::FieldOrigin;

    #[test]
    fn test_every_page_field_has_a_selector() {
        for field in Field::ALL {
            assert_eq!(
                field_selector(field).is_some(),
                field.origin() == FieldOrigin::Page,
                "{field}"
            );
        }
    }

    #[test]
    fn test_labelled_fields_use_following_sibling() {
        let selector = field_selector(Field::Phone).unwrap();
        assert_eq!(
            selector,
            Selector::xpath("//span[contains(text(), 'Téléphone')]/following-sibling::span[1]")
        );
    }

    #[test]
    fn test_no_information_marker() {
        let selectors = SiteSelectors::default();
        assert!(selectors.no_information.to_string().contains(NO_INFORMATION_TEXT));
    }
}
