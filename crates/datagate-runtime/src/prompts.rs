//! Instructions sent to the generation service.
//!
//! Schema facts never appear here: the generation instruction gets its table
//! list from the principal's scoped schema, so a forbidden table is never named
//! as available.

use datagate_policy::ScopedSchema;

pub const INTENT_INSTRUCTION: &str = "Tu analyses la question de l'utilisateur et extrais :
- L'intention : agrégation, filtrage, comparaison, tendance, détail
- Les entités : tables, colonnes, valeurs mentionnées
- Les contraintes : temporelles, géographiques, etc.

Retourne une analyse structurée en texte clair.
Exemple :
Intention : agrégation (comptage)
Entités : table clients, colonne ville, valeur \"Paris\", colonne statut, valeur \"actif\"
Contraintes : aucune contrainte temporelle

Ne génère PAS de SQL. Tu analyses uniquement la question.";

const SQL_RULES: &str = "ATTENTION :
- N'utilise AUCUNE table absente de la liste ci-dessus.
- N'ajoute PAS de conditions qui ne sont pas demandées (pas de filtre temporel si non demandé).
- Traduis EXACTEMENT la question en SQL, rien de plus.

Règles strictes :
- SELECT uniquement (jamais INSERT, UPDATE, DELETE, DROP)
- Une seule requête, sans point-virgule ni commentaire
- Utilise UNIQUEMENT les valeurs de statut listées ci-dessus
- Utilise des alias lisibles (AS nom_colonne)
- PostgreSQL syntax uniquement
- Utilise les JOINs corrects selon les relations ci-dessus

Retourne UNIQUEMENT la requête SQL, sans explication.
Format : la requête SQL brute, rien d'autre.";

pub const FORMAT_INSTRUCTION: &str = "Tu reçois les résultats d'une requête SQL (JSON avec colonnes et lignes).

Reformule en langage naturel français, compréhensible pour un non-technicien.

Règles :
- Réponds en français courant
- Utilise des tableaux Markdown si plus de 2 lignes de résultats
- Arrondis les montants à 2 décimales avec le symbole €
- Ajoute un bref résumé / insight si pertinent
- Ne montre PAS la requête SQL
- Si le résultat est vide, dis-le simplement

Exemple :
\"Il y a 10 clients actifs à Paris. C'est la ville avec le plus de clients dans la base.\"";

/// Text handed to the formatting stage when the query returned no row.
pub const EMPTY_RESULT: &str = "Aucun résultat trouvé.";

/// Instruction for the SQL generation call, scoped to what the principal may read.
pub fn generation_instruction(schema: &ScopedSchema) -> String {
    format!(
        "À partir de l'intention analysée et du contexte schéma fourni, \
         génère UNE requête SQL PostgreSQL.\n\n{}\n{}",
        schema.render_instruction(),
        SQL_RULES
    )
}

/// Instruction for the security review call.
pub fn review_instruction(schema: &ScopedSchema, marker: &str) -> String {
    let tables: Vec<&str> = schema.table_names().collect();
    format!(
        "Tu reçois une requête SQL. Vérifie :

1. C'est un SELECT uniquement (pas de DROP, DELETE, UPDATE, INSERT, ALTER, TRUNCATE)
2. Pas de sous-requêtes destructrices
3. Pas de tentative d'injection SQL (commentaires --, ;, UNION non justifié)
4. Les tables référencées sont valides : {}
5. Pas d'accès à des tables système (pg_*, information_schema)

Si la requête est SÛRE : retourne la requête SQL telle quelle, sans modification.
Si la requête est DANGEREUSE : retourne \"{} : \" suivi de l'explication du problème.",
        tables.join(", "),
        marker
    )
}
