//! Built-in signature tables and canned refusals.
//!
//! Each category is an ordered list of regular expressions, matched
//! case-insensitively. Order matters only for telemetry: `first_match` reports
//! the lowest index that matched.

use datagate_core::ClassificationCategory;

// =============================================================================
// GREETING
// =============================================================================

pub const GREETING: &[&str] = &[
    // Salutations (FR)
    r"\b(bonjour|bonsoir|salut|coucou|hey|wesh|yo|salam)\b",
    // Salutations (EN)
    r"\b(hello|hi|hey|good morning|good evening|good afternoon)\b",
    // Thanks and farewells
    r"\b(merci|au revoir|bye|goodbye|à bientôt|à plus|adieu|bonne journée|bonne soirée)\b",
    // Questions about the assistant itself
    r"\b(qui es-tu|tu es qui|what are you|comment tu t'appelles|tu fais quoi|c'est quoi)\b",
    r"\b(quel est ton (nom|rôle)|présente-toi|tu sers à quoi)\b",
    // Help requests
    r"\b(aide|help|comment ça marche|comment utiliser|tu peux m'aider)\b",
    r"\b(que (peux|sais)-tu faire|tes capacités|tes fonctionnalités)\b",
];

// =============================================================================
// OFF TOPIC
// =============================================================================

pub const OFF_TOPIC: &[&str] = &[
    // Weather
    r"\b(météo|weather|température|pluie|soleil|neige|vent|orage|nuage|tempête)\b",
    r"\b(brouillard|grêle|canicule|verglas|climat|prévision|forecast)\b",
    r"(temps qu.il fait|quel temps|il fait .* temps|il fait (beau|chaud|froid|moche))",
    // Humour
    r"\b(blague|joke|humour|drôle|funny|raconte|rigolo|marrant|gag|sketch)\b",
    r"\b(devinette|charade|poème|poésie|rime)\b",
    // Cooking
    r"\b(recette|cuisine|cuisson|ingrédient|manger|plat|restaurant|menu|repas)\b",
    r"\b(dîner|déjeuner|petit-déjeuner|gâteau|dessert|pâtisserie|boulangerie)\b",
    r"\b(végétarien|végan|régime|calorie|nutrition)\b",
    // Programming
    r"\b(python|javascript|java|html|css|typescript|react|angular|vue)\b",
    r"\b(programmer|coder|développer|framework|library|api|github|gitlab)\b",
    r"\b(algorithme|variable|fonction|boucle|compiler|debug|bug|stack)\b",
    r"\b(php|ruby|rust|golang|swift|kotlin|flutter|django|nodejs)\b",
    // Politics
    r"\b(politique|élection|président|parti|gouvernement|ministre|député)\b",
    r"\b(sénat|parlement|vote|référendum|loi|constitution|campagne)\b",
    r"\b(gauche|droite|macron|trump|biden|démocratie|dictature)\b",
    // Sport
    r"\b(sport|football|tennis|basket|rugby|natation|athlétisme|volleyball)\b",
    r"\b(olympique|coupe du monde|championnat|ligue|fifa|uefa|nba)\b",
    r"\b(but|score|équipe|joueur|entraîneur|arbitre|stade|marathon)\b",
    r"\b(handball|golf|ski|surf|boxe|karaté|judo|escrime|cyclisme)\b",
    // Entertainment
    r"\b(film|série|musique|chanson|acteur|actrice|cinéma|netflix|disney)\b",
    r"\b(youtube|spotify|streaming|concert|album|artiste|réalisateur)\b",
    r"\b(oscar|grammy|jeu vidéo|gaming|playstation|xbox|nintendo|manga|anime)\b",
    r"\b(roman|livre|auteur|écrivain|bibliothèque|lecture|bande dessinée)\b",
    // Travel
    r"\b(voyag|vacance|hôtel|avion|train|destination|tourisme|croisière)\b",
    r"\b(plage|montagne|camping|visa|passeport|billet|valise|aéroport)\b",
    r"\b(airbnb|booking|excursion|itinéraire|road trip)\b",
    // Health
    r"\b(santé|médecin|maladie|symptôme|docteur|hôpital|pharmacie)\b",
    r"\b(médicament|ordonnance|douleur|fièvre|grippe|covid|vaccin|virus)\b",
    r"\b(chirurgie|opération|dentiste|kiné|psychologue|thérapie|allergie)\b",
    // Animals
    r"\b(animal|animaux|chien|chat|oiseau|poisson|hamster|lapin|tortue)\b",
    r"\b(vétérinaire|cheval|serpent|araignée|insecte|zoo|aquarium)\b",
    // Education
    r"\b(école|université|examen|cours|diplôme|étudiant|professeur)\b",
    r"\b(baccalauréat|licence|master|doctorat|thèse|scolaire|bourse)\b",
    // Religion
    r"\b(religion|dieu|église|mosquée|synagogue|temple|prière|bible|coran)\b",
    r"\b(foi|spirituel|croyance|athée|bouddhisme|islam|christianisme)\b",
    // Relationships
    r"\b(amour|couple|mariage|divorce|rencontre|relation|sentiment)\b",
    r"\b(cœur|jalousie|rupture|fiancé|célibataire|tinder|dating)\b",
    // Fashion
    r"\b(mode|vêtement|chaussure|robe|pantalon|marque|tendance|shopping)\b",
    r"\b(bijou|accessoire|parfum|maquillage|coiffure|beauté|cosmétique)\b",
    // Astrology
    r"\b(horoscope|astrologie|signe|zodiaque|verseau|balance|scorpion)\b",
    r"\b(tarot|voyance|médium|ésotéri|paranormal|fantôme|ovni)\b",
    // General culture
    r"\b(capitale|population|superficie|continent|océan|fleuve|montagne)\b",
    r"\b(roi|reine|empereur|guerre|bataille|révolution|siècle|histoire)\b",
    // Science
    r"\b(mathématique|physique|chimie|biologie|formule|équation|atome)\b",
    r"\b(molécule|espace|planète|galaxie|étoile|solaire|gravité|quantique)\b",
    r"\b(dinosaure|fossile|évolution|darwin|adn|génétique|cellule)\b",
    // Real estate
    r"\b(immobilier|appartement|maison|loyer|achat|vente|hypothèque)\b",
    r"\b(déménagement|propriétaire|locataire|agence immobilière)\b",
    // Cars
    r"\b(voiture|automobile|moto|vélo|permis de conduire|essence|diesel)\b",
    r"\b(tesla|bmw|mercedes|peugeot|renault|pneu|garage|mécanicien)\b",
    // News
    r"\b(actualité|nouvelles|journal|infos|presse|média|reporter|journaliste)\b",
    // Personal finance
    r"\b(bourse|bitcoin|crypto|action|investir|épargne|placement|trading)\b",
    r"\b(impôt|taxe|retraite|assurance|banque|crédit|prêt|hypothèque)\b",
    // DIY and gardening
    r"\b(bricolage|jardinage|plante|fleur|arbre|pelouse|potager|outil)\b",
    r"\b(peinture|plomberie|électricité|carrelage|rénovation|menuiserie)\b",
    // Consumer tech
    r"\b(smartphone|iphone|samsung|android|ios|tablette|gadget)\b",
    r"\b(wifi|bluetooth|5g|fibre|internet|réseau social|facebook|instagram|tiktok)\b",
];

// =============================================================================
// DESTRUCTIVE INTENT
// =============================================================================

pub const DESTRUCTIVE_INTENT: &[&str] = &[
    // Write and DDL keywords
    r"\b(DROP|DELETE|UPDATE|INSERT|ALTER|TRUNCATE|GRANT|REVOKE)\b",
    r"\b(CREATE|RENAME|REPLACE|MERGE|UPSERT)\b",
    r"\b(EXEC|EXECUTE|xp_|sp_)\b",
    r"\b(SHUTDOWN|KILL|BACKUP|RESTORE)\b",
    // Destructive verbs (FR)
    r"\b(supprime[rz]?|efface[rz]?|détruire?|détruis)\b",
    r"\b(vide[rz]?|purge[rz]?|nettoie[rz]?|nettoyer)\b",
    r"\b(modifie[rz]?|modifier|édite[rz]?|éditer)\b",
    r"\b(met[sz]?\s.*à jour|mise à jour|mettre à jour)\b",
    r"\b(ajoute[rz]?|ajouter|insère[rz]?|insérer)\b",
    r"\b(créer|crée[rz]?|renomme[rz]?|renommer)\b",
    r"\b(remplace[rz]?|remplacer|écrase[rz]?|écraser)\b",
    r"\b(réinitialise[rz]?|réinitialiser|reset)\b",
    r"\b(enlève[rz]?|enlever|retire[rz]?|retirer)\b",
    r"\b(restaure[rz]?|restaurer|migre[rz]?|migrer)\b",
];

// =============================================================================
// SQL INJECTION
// =============================================================================

pub const SQL_INJECTION: &[&str] = &[
    // Comments and statement separators
    r"(--|;|/\*|\*/|@@|#\s)",
    // Encoding functions
    r"(char\(|nchar\(|varchar\(|concat\(|hex\(|unhex\()",
    r"(0x[0-9a-fA-F]+)",
    // UNION based
    r"(\bUNION\b.*\bSELECT\b)",
    r"(\bUNION\b\s+\bALL\b)",
    // Always-true predicates
    r"(\bOR\b\s+\d+\s*=\s*\d+)",
    r"(\bAND\b\s+\d+\s*=\s*\d+)",
    r#"(\bOR\b\s+['"].*['"]\s*=\s*['"])"#,
    r"(\bOR\b\s+''='')",
    r"(\bOR\b\s+true\b)",
    // Time based
    r"\b(SLEEP|WAITFOR|DELAY|BENCHMARK|pg_sleep)\b",
    // System catalogs
    r"\b(pg_catalog|pg_shadow|pg_roles|pg_user|pg_tables)\b",
    r"\b(information_schema|sys\.|sysobjects|syscolumns)\b",
    // File operations
    r"\b(LOAD_FILE|INTO\s+OUTFILE|INTO\s+DUMPFILE|COPY\s+TO|COPY\s+FROM)\b",
];

// =============================================================================
// PROMPT INJECTION
// =============================================================================

pub const PROMPT_INJECTION: &[&str] = &[
    // Instruction override (FR)
    r"(ignore[rz]?\s+(tes|les|mes|ces)\s+instructions)",
    r"(oublie[rz]?\s+(tes|les|mes|ces)\s+instructions)",
    r"(ne\s+(tiens?|tenez)\s+pas\s+compte)",
    r"(fais\s+comme\s+si|fais\s+semblant)",
    // Instruction override (EN)
    r"(ignore\s+(previous|all|your|the)\s+instructions?)",
    r"(forget\s+(your|all|previous)\s+instructions?)",
    r"(disregard\s+(your|all|previous))",
    // Role change (FR)
    r"(tu\s+es\s+maintenant|agis\s+comme|joue\s+le\s+rôle)",
    r"(comporte[- ]toi\s+comme|deviens|transforme[- ]toi)",
    r"(ton\s+nouveau\s+rôle|ta\s+nouvelle\s+mission)",
    // Role change (EN)
    r"(you\s+are\s+now|act\s+as|pretend\s+(you are|to be))",
    r"(your\s+new\s+role|your\s+new\s+purpose)",
    r"(roleplay|role[- ]play)",
    // Jailbreak vocabulary
    r"\b(jailbreak|bypass|contourne[rz]?|hack|exploit)\b",
    r"\b(DAN|do anything now)\b",
    r"(developer\s+mode|mode\s+développeur|god\s+mode|admin\s+mode)",
    r"(no\s+restrictions?|sans\s+restrictions?|sans\s+limites?)",
    r"(no\s+rules?|sans\s+règles?)",
    r"(unrestricted|unfiltered|uncensored)",
    // System prompt extraction
    r"(system\s+prompt|prompt\s+système|instructions?\s+système)",
    r"(montre[rz]?\s+(tes|les)\s+(instructions|règles|consignes))",
    r"(affiche[rz]?\s+(ton|le)\s+prompt)",
    r"(répète[rz]?\s+(tes|les)\s+instructions)",
    r"(show\s+(me\s+)?(your|the)\s+(prompt|instructions|rules))",
    r"(reveal\s+(your|the)\s+(prompt|instructions|system))",
    // Chat template tokens
    r"(\[SYSTEM\]|\[INST\]|\[/INST\]|<<SYS>>|<\|im_start\|>)",
    r"(###\s*(System|Human|Assistant|Instruction))",
    // Override vocabulary
    r"\b(override|outrepasse[rz]?|surcharge[rz]?|dépasse[rz]?)\b",
    r"(priorité\s+maximale|highest\s+priority|urgent\s+override)",
];

/// Built-in signatures of a category, in match order.
pub fn builtin(category: ClassificationCategory) -> &'static [&'static str] {
    match category {
        ClassificationCategory::Greeting => GREETING,
        ClassificationCategory::OffTopic => OFF_TOPIC,
        ClassificationCategory::DestructiveIntent => DESTRUCTIVE_INTENT,
        ClassificationCategory::SqlInjection => SQL_INJECTION,
        ClassificationCategory::PromptInjection => PROMPT_INJECTION,
    }
}

// =============================================================================
// REFUSALS
// =============================================================================

pub const GREETING_RESPONSE: &str = "Bonjour ! Je suis votre **AI Data Assistant**.\n\n\
Mon rôle est de répondre à vos questions sur les données de l'entreprise \
(clients, produits, commandes) en les transformant en requêtes SQL.\n\n\
Voici quelques exemples de questions que vous pouvez me poser :\n\
- Combien de clients actifs sont dans chaque ville ?\n\
- Quel est le chiffre d'affaires total ?\n\
- Quels sont les 5 produits les plus vendus ?\n\
- Quelles sont les commandes de Marie Dupont ?\n\n\
Comment puis-je vous aider ?";

pub const OFF_TOPIC_RESPONSE: &str = "Désolé, je ne suis pas en mesure de répondre à ce type de question. \
Mon domaine se limite aux **données de l'entreprise** : clients, produits et commandes.\n\n\
Essayez par exemple :\n\
- Quel est le chiffre d'affaires total ?\n\
- Combien de clients actifs par ville ?\n\
- Quels sont les produits les plus vendus ?";

pub const DESTRUCTIVE_RESPONSE: &str = "Je ne peux pas effectuer d'opérations de modification sur la base de données. \
Mon rôle est uniquement de **consulter** les données (lecture seule).\n\n\
Essayez plutôt une question de consultation :\n\
- Quels sont les clients actifs ?\n\
- Quel est le chiffre d'affaires total ?\n\
- Quels sont les produits les plus vendus ?";

pub const PROMPT_INJECTION_RESPONSE: &str = "Tentative de manipulation détectée. Je ne peux pas modifier mon comportement.\n\n\
Je suis un **assistant data** dédié aux questions sur les données de l'entreprise.\n\n\
Essayez par exemple :\n\
- Quel est le chiffre d'affaires total ?\n\
- Combien de clients actifs par ville ?\n\
- Quels sont les produits les plus vendus ?";

pub const REVIEW_RESPONSE: &str = "La requête générée a été rejetée par la vérification de sécurité. \
Je ne peux consulter les données qu'en lecture seule, sur les tables qui vous sont autorisées.";

pub const EMPTY_GENERATION_RESPONSE: &str = "Je n'ai pas pu construire de requête pour cette question. \
Essayez de la reformuler, par exemple : « Combien de clients actifs par ville ? »";

/// Canned refusal for a category.
///
/// `sql_injection` shares the destructive refusal: both mean the caller is
/// trying to get something other than a read out of the database.
pub fn refusal(category: ClassificationCategory) -> &'static str {
    match category {
        ClassificationCategory::Greeting => GREETING_RESPONSE,
        ClassificationCategory::OffTopic => OFF_TOPIC_RESPONSE,
        ClassificationCategory::DestructiveIntent | ClassificationCategory::SqlInjection => {
            DESTRUCTIVE_RESPONSE
        }
        ClassificationCategory::PromptInjection => PROMPT_INJECTION_RESPONSE,
    }
}

/// Refusal naming the tables the principal may not read.
pub fn unauthorized_tables_response<'a>(tables: impl IntoIterator<Item = &'a str>) -> String {
    let names: Vec<&str> = tables.into_iter().collect();
    format!(
        "Accès refusé : vous n'avez pas les droits nécessaires sur la ou les tables suivantes : {}.\n\n\
         Contactez un administrateur si vous avez besoin d'y accéder.",
        names.join(", ")
    )
}
