use super::Category;

/// Keyword table for the local fallback classifier.
///
/// Declaration order matters: ties are broken by the first category listed.
/// The lists are tuned for francophone West African news coverage.
pub const KEYWORD_TABLE: &[(Category, &[&str])] = &[
    (
        Category::Politics,
        &[
            "gouvernement",
            "ministre",
            "président",
            "assemblée",
            "député",
            "élection",
            "vote",
            "parti",
            "politique",
            "diplomatie",
            "transition",
            "décret",
            "loi",
            "réforme",
            "gouverneur",
            "maire",
            "ambassadeur",
            "sommet",
            "souveraineté",
        ],
    ),
    (
        Category::Economy,
        &[
            "économie",
            "fcfa",
            "budget",
            "commerce",
            "entreprise",
            "banque",
            "agriculture",
            "industrie",
            "emploi",
            "investissement",
            "marché",
            "production",
            "exportation",
            "croissance",
            "inflation",
            "coton",
            "mine",
            "dette",
            "fiscal",
            "chômage",
        ],
    ),
    (
        Category::Security,
        &[
            "sécurité",
            "armée",
            "militaire",
            "police",
            "terrorisme",
            "attaque",
            "gendarmerie",
            "criminalité",
            "justice",
            "tribunal",
            "procès",
            "condamnation",
            "opération",
            "défense",
            "frontière",
            "trafic",
            "enlèvement",
            "attentat",
        ],
    ),
    (
        Category::Health,
        &[
            "santé",
            "hôpital",
            "médecin",
            "maladie",
            "épidémie",
            "vaccination",
            "patient",
            "traitement",
            "médicament",
            "paludisme",
            "soins",
            "sanitaire",
            "clinique",
            "malnutrition",
            "prévention",
            "dépistage",
            "pharmacie",
            "urgence",
        ],
    ),
    (
        Category::Culture,
        &[
            "culture",
            "festival",
            "artiste",
            "musique",
            "cinéma",
            "théâtre",
            "éducation",
            "école",
            "université",
            "étudiant",
            "livre",
            "tradition",
            "patrimoine",
            "enseignant",
            "recherche",
            "musée",
            "danse",
            "littérature",
            "concert",
            "exposition",
        ],
    ),
    (
        Category::Sport,
        &[
            "sport",
            "football",
            "match",
            "équipe",
            "joueur",
            "entraîneur",
            "championnat",
            "coupe",
            "compétition",
            "victoire",
            "défaite",
            "but",
            "stade",
            "qualification",
            "sélection",
            "athlétisme",
            "basketball",
            "cyclisme",
            "médaille",
            "tournoi",
        ],
    ),
];
