/*!

This is the long-form manual for `fractal_form` and `fractal`.

## Forms

Two questionnaires are supported. They share all their rules:

* `standard` (form id `pergunta3`): the ranked answers respond to "Suponha que você joga
  na Mega-Sena e ganha. Cite as 3 primeiras coisas que faria com o dinheiro."
* `behaviorFractal` (form id `pergunta2`): the ranked answers respond to "Cite três aspectos
  mais frequentes que seus amigos pensam de você." This form also asks for the behavior
  fractal label.

## Fields

Every field has a wire name, used in answer files, spreadsheet headers and error reports:

| wire name | content | rule |
|-----------|---------|------|
| `fullName` | full name, capitalized while typing | at least two words |
| `email` | email | `local@domain.tld` |
| `birthPlace` | place of birth | required |
| `nationalId` | CPF, shown as `XXX.XXX.XXX-XX` | valid check digits |
| `birthDate` | `YYYY-MM-DD` | required |
| `purposeStatement` | why the respondent takes part | required |
| `applicationMode` | `self-applied` (`auto`) or `assisted` (`assistida`) | required |
| `applicatorName` | name of the applicator | required when assisted |
| `activityChoice` | `self` (`propria`) or `applicator` (`aplicador`) | required |
| `behaviorFractal` | label of the behavior fractal | required, `behaviorFractal` form only |
| `answerText1` .. `answerText3` | the three answers | required |
| `rank1` .. `rank3` | `high` (`3`), `medium` (`2`) or `low` (`1`) | required, all different |
| `justification1` .. `justification3` | why each answer | required |
| `finalFeedback` | closing reflection | required |

The Portuguese labels of the ranks (`Maior importância`, `Média importância`,
`Menor importância`) are also accepted. Giving a rank to an answer removes it from
any other answer that held it.

## Submission

When all the fields are valid, the record is stamped with the end time, the number of minutes
spent on the form and the date, then posted once as JSON to the collector. The collector does
not answer in a readable way: a submission is considered delivered when no network error
happened. After a network error, the form can be submitted again.

## Command line

`fractal` replays answers through the forms and reports what happened to each of them.

```bash
fractal --config responses_config.json --out summary.json
fractal --input maria.json --variant behaviorFractal --dry-run --out stdout
fractal --input export.xlsx --input-type xlsx --excel-worksheet-name Respostas --dry-run
```

### Configuration file

```json
{
  "formSettings": {
    "variant": "standard",
    "formId": "pergunta3",
    "collectorUrl": "https://script.google.com/macros/s/.../exec",
    "timeoutSeconds": 30
  },
  "responseSources": [
    { "provider": "json", "filePath": "maria.json" },
    { "provider": "xlsx", "filePath": "export.xlsx", "excelWorksheetName": "Respostas", "firstRowIndex": 1 }
  ]
}
```

Without `collectorUrl`, or with `--dry-run`, nothing is sent: the records are only logged.

### `json`

One object mapping wire names to values, or an array of such objects.

### `xlsx`

A spreadsheet whose header row (`firstRowIndex`, starting at 1) holds wire names. Every
following row is one response. Unknown columns, such as the timestamps added by the
collector, are ignored. National IDs stored as numbers get their leading zeros back.

### Summary

```json
{
  "form": { "formId": "pergunta3", "variant": "standard" },
  "responses": [
    { "source": "maria.json-00000001", "status": "submitted", "errors": {} }
  ]
}
```

The status is one of `submitted`, `invalid` and `transportFailed`. With `--reference`, the summary
is compared with a previous one and the differences are printed.

*/
